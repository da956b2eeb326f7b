//! Client for the managed record store (PostgREST-style REST API).
//!
//! Three tables are read and written: `transactions`, `leads` and
//! `appointments`. Row-level ownership is enforced by the store itself from the
//! caller's bearer token; this client only forwards it.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::UpstreamError;
use crate::models::{
    Appointment, AppointmentStatus, EntryStatus, EntryType, FinancialEntry, Lead, LeadStatus,
    Temperature,
};
use crate::session::UserSession;
use crate::sources::upstream::{expect_success, flexible, read_json};
use crate::sources::{samples, DataSource};

const SERVICE: &str = "record store";

// ============================================================================
// Store rows (external column names)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRow {
    #[serde(deserialize_with = "flexible::id")]
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flexible::f64")]
    pub unit_value: f64,
    #[serde(default, deserialize_with = "flexible::f64")]
    pub discount: f64,
    #[serde(default, deserialize_with = "flexible::f64")]
    pub addition: f64,
    #[serde(default, deserialize_with = "flexible::f64")]
    pub total: f64,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadRow {
    #[serde(deserialize_with = "flexible::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: LeadStatus,
    #[serde(default)]
    pub temperature: Option<Temperature>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "flexible::f64")]
    pub potential_value: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRow {
    #[serde(deserialize_with = "flexible::id")]
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    pub patient_name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub status: AppointmentStatus,
}

/// A domain entity persisted in one store table.
pub trait StoreRecord: Sized + Send + Sync + 'static {
    type Row: DeserializeOwned + Send;

    /// Entity name used in log lines.
    const KIND: &'static str;
    const TABLE: &'static str;
    /// PostgREST `order` parameter for reads.
    const ORDER: &'static str;

    fn from_row(row: Self::Row) -> Self;
    fn to_row(&self, owner: Option<&str>) -> Value;
    fn id(&self) -> &str;
    fn samples<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<Self>;
}

impl StoreRecord for FinancialEntry {
    type Row = TransactionRow;
    const KIND: &'static str = "financial entries";
    const TABLE: &'static str = "transactions";
    const ORDER: &'static str = "date.desc";

    fn from_row(row: TransactionRow) -> Self {
        FinancialEntry {
            id: row.id,
            date: row.date,
            entry_type: row.entry_type,
            category: row.category.unwrap_or_default(),
            name: row.description.unwrap_or_default(),
            unit_value: row.unit_value,
            discount: row.discount,
            addition: row.addition,
            total: row.total,
            status: row.status,
        }
    }

    fn to_row(&self, owner: Option<&str>) -> Value {
        with_owner(
            json!({
                "id": self.id,
                "date": self.date,
                "type": self.entry_type,
                "category": self.category,
                "description": self.name,
                "unit_value": self.unit_value,
                "discount": self.discount,
                "addition": self.addition,
                "total": self.total,
                "status": self.status,
            }),
            owner,
        )
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn samples<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<Self> {
        samples::sample_entries(today, rng)
    }
}

impl StoreRecord for Lead {
    type Row = LeadRow;
    const KIND: &'static str = "leads";
    const TABLE: &'static str = "leads";
    const ORDER: &'static str = "created_at.desc";

    fn from_row(row: LeadRow) -> Self {
        Lead {
            id: row.id,
            name: row.name,
            phone: row.phone.unwrap_or_default(),
            status: row.status,
            temperature: row.temperature.unwrap_or(Temperature::Warm),
            last_message: row.last_message.unwrap_or_default(),
            potential_value: row.potential_value,
            created_at: row.created_at,
        }
    }

    fn to_row(&self, owner: Option<&str>) -> Value {
        with_owner(
            json!({
                "id": self.id,
                "name": self.name,
                "phone": self.phone,
                "status": self.status,
                "temperature": self.temperature,
                "last_message": self.last_message,
                "potential_value": self.potential_value,
                "created_at": self.created_at,
            }),
            owner,
        )
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn samples<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<Self> {
        samples::sample_leads(today, rng)
    }
}

impl StoreRecord for Appointment {
    type Row = AppointmentRow;
    const KIND: &'static str = "appointments";
    const TABLE: &'static str = "appointments";
    const ORDER: &'static str = "date.asc";

    fn from_row(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            date: row.date,
            time: row.time.map(|t| clock_time(&t)).unwrap_or_default(),
            patient_name: row.patient_name,
            kind: row.kind.unwrap_or_else(|| "Consultation".to_string()),
            status: row.status,
            is_google: false,
        }
    }

    fn to_row(&self, owner: Option<&str>) -> Value {
        with_owner(
            json!({
                "id": self.id,
                "date": self.date,
                "time": self.time,
                "patient_name": self.patient_name,
                "type": self.kind,
                "status": self.status,
            }),
            owner,
        )
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn samples<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<Self> {
        samples::sample_appointments(today, rng)
    }
}

fn with_owner(mut row: Value, owner: Option<&str>) -> Value {
    if let (Some(owner), Some(map)) = (owner, row.as_object_mut()) {
        map.insert("user_id".to_string(), Value::String(owner.to_string()));
    }
    row
}

/// `time` columns come back as `HH:MM:SS`; the dashboard shows `HH:MM`.
fn clock_time(raw: &str) -> String {
    let raw = raw.trim();
    match raw.match_indices(':').nth(1) {
        Some((idx, _)) => raw[..idx].to_string(),
        None => raw.to_string(),
    }
}

// ============================================================================
// StoreClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct StoreClient {
    http: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl StoreClient {
    pub fn new(http: Client, base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.api_key.is_some()
    }

    fn request(
        &self,
        method: Method,
        table: &str,
        session: Option<&UserSession>,
    ) -> Result<RequestBuilder, UpstreamError> {
        let (Some(base_url), Some(api_key)) = (&self.base_url, &self.api_key) else {
            return Err(UpstreamError::NotConfigured(SERVICE));
        };
        let bearer = session
            .map(|s| s.access_token.as_str())
            .unwrap_or(api_key.as_str());
        Ok(self
            .http
            .request(method, format!("{}/rest/v1/{}", base_url, table))
            .header("apikey", api_key)
            .bearer_auth(bearer))
    }

    /// Read every row of `R`'s table visible to the session, in table order.
    pub async fn select<R: StoreRecord>(
        &self,
        session: Option<&UserSession>,
    ) -> Result<Vec<R>, UpstreamError> {
        let response = self
            .request(Method::GET, R::TABLE, session)?
            .query(&[("select", "*"), ("order", R::ORDER)])
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;

        let rows: Vec<R::Row> = read_json(SERVICE, response).await?;
        debug!("Read {} {} rows from store", rows.len(), R::KIND);
        Ok(rows.into_iter().map(R::from_row).collect())
    }

    pub async fn insert<R: StoreRecord>(
        &self,
        record: &R,
        session: Option<&UserSession>,
    ) -> Result<(), UpstreamError> {
        let owner = session.and_then(|s| s.user_id.as_deref());
        let response = self
            .request(Method::POST, R::TABLE, session)?
            .header("Prefer", "return=minimal")
            .json(&record.to_row(owner))
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;
        expect_success(SERVICE, response).await
    }

    /// Replace the stored row with the same id.
    pub async fn update<R: StoreRecord>(
        &self,
        record: &R,
        session: Option<&UserSession>,
    ) -> Result<(), UpstreamError> {
        let owner = session.and_then(|s| s.user_id.as_deref());
        let response = self
            .request(Method::PATCH, R::TABLE, session)?
            .query(&[("id", format!("eq.{}", record.id()))])
            .header("Prefer", "return=minimal")
            .json(&record.to_row(owner))
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;
        expect_success(SERVICE, response).await
    }

    pub async fn delete<R: StoreRecord>(
        &self,
        id: &str,
        session: Option<&UserSession>,
    ) -> Result<(), UpstreamError> {
        let response = self
            .request(Method::DELETE, R::TABLE, session)?
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;
        expect_success(SERVICE, response).await
    }
}

// ============================================================================
// StoreSource: store reads with sample-data fallback
// ============================================================================

/// [`DataSource`] backed by one store table, falling back to randomized
/// sample records anchored on `today`.
pub struct StoreSource<'a, R> {
    store: &'a StoreClient,
    session: Option<&'a UserSession>,
    today: NaiveDate,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R> StoreSource<'a, R> {
    pub fn new(store: &'a StoreClient, session: Option<&'a UserSession>, today: NaiveDate) -> Self {
        Self {
            store,
            session,
            today,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<'a, R: StoreRecord> DataSource<R> for StoreSource<'a, R> {
    fn kind(&self) -> &'static str {
        R::KIND
    }

    async fn fetch_real(&self) -> Result<Vec<R>, UpstreamError> {
        self.store.select::<R>(self.session).await
    }

    fn fetch_fallback(&self) -> Vec<R> {
        R::samples(self.today, &mut rand::thread_rng())
    }
}
