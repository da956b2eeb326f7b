//! Domain models for the clinic dashboard.
//!
//! Entities mirror the three store tables (financial transactions, leads,
//! appointments) after mapping from the store's column names. JSON bodies
//! exchanged with the dashboard UI use camelCase keys and `YYYY-MM-DD` dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::campaigns::CampaignReport;
use crate::analytics::consolidate::ConsolidatedMetrics;
use crate::analytics::date_range::DateRange;
use crate::pipeline::{LeadStageChanged, ProposeFinancialEntry};
use crate::sources::Origin;

// ============================================================================
// Financial entries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Payable,
    Receivable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Effected,
    Overdue,
    Cancelled,
}

/// A payable or receivable ledger line.
///
/// `total` is computed once in [`FinancialEntry::new`]; entries mapped from the
/// store keep the stored total as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: String,
    pub name: String,
    pub unit_value: f64,
    pub discount: f64,
    pub addition: f64,
    pub total: f64,
    pub status: EntryStatus,
}

/// User-supplied fields of a new entry; the total is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialEntryDraft {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: String,
    pub name: String,
    pub unit_value: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub addition: f64,
    pub status: EntryStatus,
}

impl FinancialEntry {
    pub fn new(id: impl Into<String>, draft: FinancialEntryDraft) -> Self {
        let total = draft.unit_value - draft.discount + draft.addition;
        Self {
            id: id.into(),
            date: draft.date,
            entry_type: draft.entry_type,
            category: draft.category,
            name: draft.name,
            unit_value: draft.unit_value,
            discount: draft.discount,
            addition: draft.addition,
            total,
            status: draft.status,
        }
    }
}

// ============================================================================
// Leads
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    InConversation,
    Scheduled,
    Sale,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub status: LeadStatus,
    pub temperature: Temperature,
    pub last_message: String,
    pub potential_value: f64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Appointments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Done,
    Cancelled,
}

/// A scheduled visit. Calendar-sourced appointments carry `is_google = true`
/// and are never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub date: NaiveDate,
    pub time: String,
    pub patient_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub is_google: bool,
}

impl Appointment {
    pub fn is_read_only(&self) -> bool {
        self.is_google
    }
}

// ============================================================================
// Request Models
// ============================================================================

/// Body of `POST /api/google-ads`. Field names follow the browser client.
#[derive(Debug, Deserialize)]
pub struct GoogleAdsProxyRequest {
    pub action: String,
    pub access_token: Option<String>,
    pub customer_id: Option<String>,
    pub date_range: Option<String>,
}

/// Body of `POST /api/dashboard/metrics`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
    #[serde(default = "default_period")]
    pub period: String,
    pub ticket_value: Option<f64>,
    pub calendar_token: Option<String>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaConnectionInput {
    pub access_token: String,
    pub ad_account_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAdsConnectionInput {
    pub access_token: String,
    pub customer_id: String,
}

/// Body of `POST /api/dashboard/campaigns`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignsRequest {
    #[serde(default = "default_period")]
    pub period: String,
    pub meta: Option<MetaConnectionInput>,
    pub google_ads: Option<GoogleAdsConnectionInput>,
    pub as_of: Option<NaiveDate>,
}

/// Body of `POST /api/leads/{id}/stage`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChangeRequest {
    pub lead: Lead,
    pub to: LeadStatus,
    pub ticket_value: Option<f64>,
}

/// Body of `POST /api/entries`.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub draft: FinancialEntryDraft,
}

fn default_period() -> String {
    "30 days".to_string()
}

// ============================================================================
// Response Models
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

/// Which path produced each entity list of a metrics response.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOrigins {
    pub entries: Origin,
    pub leads: Origin,
    pub appointments: Origin,
    pub calendar_events: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub range: DateRange,
    pub metrics: ConsolidatedMetrics,
    pub origins: SourceOrigins,
    /// A newer refresh of the same session started before this one finished;
    /// the session snapshot kept the newer lists.
    pub stale: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignsResponse {
    pub range: DateRange,
    #[serde(flatten)]
    pub report: CampaignReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChangeResponse {
    pub lead: Lead,
    pub event: Option<LeadStageChanged>,
    pub proposal: Option<ProposeFinancialEntry>,
}
