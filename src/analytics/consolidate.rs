//! # Metrics Consolidation
//!
//! Folds financial entries, leads and appointments for one reporting period
//! into the marketing, sales and financial KPIs shown on the dashboard.
//!
//! ## Policy constants
//!
//! Two business assumptions are applied and kept configurable through
//! [`MetricsPolicy`]:
//!
//! - the lead count used as a divisor never drops below `min_lead_count` (1),
//!   so a period without leads reports rates as if one lead existed;
//! - when the ledger shows exactly zero marketing spend, spend is estimated as
//!   `lead_count * estimated_cost_per_lead` (15 per lead).
//!
//! Every ratio with a possibly-zero denominator (ROI, CAC, CPV) reports 0
//! instead of NaN or infinity.

use serde::{Deserialize, Serialize};

use crate::analytics::date_range::DateRange;
use crate::models::{
    Appointment, AppointmentStatus, EntryStatus, EntryType, FinancialEntry, Lead, LeadStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPolicy {
    pub estimated_cost_per_lead: f64,
    pub min_lead_count: usize,
    pub marketing_category: String,
}

impl Default for MetricsPolicy {
    fn default() -> Self {
        Self {
            estimated_cost_per_lead: 15.0,
            min_lead_count: 1,
            marketing_category: "Marketing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingMetrics {
    pub gross_revenue: f64,
    pub operational_expense: f64,
    pub marketing_investment: f64,
    /// True when `marketing_investment` is the per-lead estimate.
    pub marketing_estimated: bool,
    pub total_expense: f64,
    /// Floored lead count used as the divisor for lead-based rates.
    pub lead_count: usize,
    /// Leads actually created inside the period.
    pub leads_in_period: usize,
    pub cpl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesMetrics {
    pub conversations: usize,
    pub sales: usize,
    pub scheduled: usize,
    pub attended: usize,
    pub conversion_rate: f64,
    pub cac: f64,
    pub cpv: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub net_profit: f64,
    pub roi: f64,
    pub average_ticket: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedMetrics {
    pub marketing: MarketingMetrics,
    pub sales: SalesMetrics,
    pub financial: FinancialMetrics,
}

/// Compute the dashboard KPIs for `range`.
///
/// Only `effected` entries count towards revenue and expenses. Leads are
/// matched on the calendar date of `created_at`.
pub fn consolidate(
    entries: &[FinancialEntry],
    leads: &[Lead],
    appointments: &[Appointment],
    range: &DateRange,
    ticket_value: f64,
    policy: &MetricsPolicy,
) -> ConsolidatedMetrics {
    let entries: Vec<&FinancialEntry> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Effected && range.contains(e.date))
        .collect();
    let leads: Vec<&Lead> = leads
        .iter()
        .filter(|l| range.contains(l.created_at.date_naive()))
        .collect();
    let appointments: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| range.contains(a.date))
        .collect();

    // Marketing
    let gross_revenue: f64 = entries
        .iter()
        .filter(|e| e.entry_type == EntryType::Receivable)
        .map(|e| e.total)
        .sum();
    let operational_expense: f64 = entries
        .iter()
        .filter(|e| {
            e.entry_type == EntryType::Payable && e.category != policy.marketing_category
        })
        .map(|e| e.total)
        .sum();
    let ledger_marketing: f64 = entries
        .iter()
        .filter(|e| {
            e.entry_type == EntryType::Payable && e.category == policy.marketing_category
        })
        .map(|e| e.total)
        .sum();

    let lead_count = leads.len().max(policy.min_lead_count);
    let marketing_estimated = ledger_marketing == 0.0;
    let marketing_investment = if marketing_estimated {
        lead_count as f64 * policy.estimated_cost_per_lead
    } else {
        ledger_marketing
    };
    let total_expense = operational_expense + marketing_investment;
    let cpl = ratio(marketing_investment, lead_count);

    // Sales
    let conversations = leads.iter().filter(|l| l.status != LeadStatus::New).count();
    let sales = leads.iter().filter(|l| l.status == LeadStatus::Sale).count();
    let scheduled = appointments.len();
    let attended = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Done)
        .count();
    let conversion_rate = ratio(scheduled as f64, lead_count) * 100.0;
    let cac = ratio(marketing_investment, scheduled);
    let cpv = ratio(marketing_investment, sales);

    // Financial
    let net_profit = gross_revenue - total_expense;
    let roi = if total_expense > 0.0 {
        net_profit / total_expense * 100.0
    } else {
        0.0
    };
    let average_ticket = if sales > 0 {
        gross_revenue / sales as f64
    } else {
        ticket_value
    };

    ConsolidatedMetrics {
        marketing: MarketingMetrics {
            gross_revenue,
            operational_expense,
            marketing_investment,
            marketing_estimated,
            total_expense,
            lead_count,
            leads_in_period: leads.len(),
            cpl,
        },
        sales: SalesMetrics {
            conversations,
            sales,
            scheduled,
            attended,
            conversion_rate,
            cac,
            cpv,
        },
        financial: FinancialMetrics {
            net_profit,
            roi,
            average_ticket,
        },
    }
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}
