//! Lead pipeline stage changes and the rules they trigger.
//!
//! Moving a lead into `sale` does not create a ledger entry by itself. It
//! emits a [`ProposeFinancialEntry`] command that the caller confirms (or
//! drops) before posting it as a new financial entry.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{EntryStatus, EntryType, FinancialEntryDraft, Lead, LeadStatus};
use crate::session::AppContext;

/// Ledger category of entries proposed for closed sales.
pub const SALE_CATEGORY: &str = "Consultation/Procedure";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStageChanged {
    pub lead_id: String,
    pub from: LeadStatus,
    pub to: LeadStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeFinancialEntry {
    pub lead_id: String,
    pub draft: FinancialEntryDraft,
}

/// Move `lead` to `to`. No event is emitted when the stage is unchanged.
pub fn change_stage(lead: &Lead, to: LeadStatus) -> (Lead, Option<LeadStageChanged>) {
    let updated = Lead {
        status: to,
        ..lead.clone()
    };
    if lead.status == to {
        return (updated, None);
    }
    let event = LeadStageChanged {
        lead_id: lead.id.clone(),
        from: lead.status,
        to,
    };
    (updated, Some(event))
}

/// Propose a receivable at the account's ticket value when a lead closes.
///
/// Events only exist for real transitions (see [`change_stage`]), so an
/// event ending in `sale` always means a newly closed sale.
pub fn evaluate_stage_change(
    event: &LeadStageChanged,
    lead: &Lead,
    ctx: &AppContext,
    today: NaiveDate,
) -> Option<ProposeFinancialEntry> {
    if event.to != LeadStatus::Sale {
        return None;
    }
    Some(ProposeFinancialEntry {
        lead_id: event.lead_id.clone(),
        draft: FinancialEntryDraft {
            date: today,
            entry_type: EntryType::Receivable,
            category: SALE_CATEGORY.to_string(),
            name: lead.name.clone(),
            unit_value: ctx.ticket_value(),
            discount: 0.0,
            addition: 0.0,
            status: EntryStatus::Effected,
        },
    })
}
