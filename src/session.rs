//! Application context: who is signed in, which integrations are connected,
//! and the account's ticket value.
//!
//! [`AppContext`] is an immutable snapshot. The `with_*` methods return a new
//! context and leave the original untouched, so components holding an older
//! snapshot never observe a change they did not ask for.
//!
//! [`SessionSnapshots`] keeps, per session, the lists the dashboard last
//! loaded plus the caller's optimistic edits to them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::models::{Appointment, FinancialEntry, Lead};
use crate::sources::{Generations, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub access_token: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaConnection {
    pub access_token: String,
    pub ad_account_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleAdsConnection {
    pub access_token: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarConnection {
    pub access_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Integrations {
    pub meta: Option<MetaConnection>,
    pub google_ads: Option<GoogleAdsConnection>,
    pub calendar: Option<CalendarConnection>,
}

impl Integrations {
    pub fn any_ad_platform(&self) -> bool {
        self.meta.is_some() || self.google_ads.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppContext {
    user: Option<UserSession>,
    integrations: Integrations,
    ticket_value: f64,
}

impl AppContext {
    pub fn new(ticket_value: f64) -> Self {
        Self {
            user: None,
            integrations: Integrations::default(),
            ticket_value,
        }
    }

    pub fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    pub fn integrations(&self) -> &Integrations {
        &self.integrations
    }

    pub fn ticket_value(&self) -> f64 {
        self.ticket_value
    }

    pub fn with_user(&self, user: Option<UserSession>) -> Self {
        Self {
            user,
            ..self.clone()
        }
    }

    pub fn with_ticket_value(&self, ticket_value: f64) -> Self {
        Self {
            ticket_value,
            ..self.clone()
        }
    }

    pub fn with_meta(&self, meta: Option<MetaConnection>) -> Self {
        let mut next = self.clone();
        next.integrations.meta = meta;
        next
    }

    pub fn with_google_ads(&self, google_ads: Option<GoogleAdsConnection>) -> Self {
        let mut next = self.clone();
        next.integrations.google_ads = google_ads;
        next
    }

    pub fn with_calendar(&self, calendar: Option<CalendarConnection>) -> Self {
        let mut next = self.clone();
        next.integrations.calendar = calendar;
        next
    }
}

/// The entity lists a dashboard session currently displays.
///
/// A refresh (for example after a period change) takes one ticket from
/// [`DashboardSnapshot::begin_refresh`] and applies all three lists with it.
/// Lists arriving with a ticket that is no longer current are discarded.
/// Optimistic writes land here whether or not the store accepts them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub entries: Vec<FinancialEntry>,
    pub leads: Vec<Lead>,
    pub appointments: Vec<Appointment>,
    #[serde(skip)]
    generations: Generations,
}

impl DashboardSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&self) -> Ticket {
        self.generations.begin()
    }

    /// Returns whether the lists were applied.
    pub fn apply(
        &mut self,
        ticket: &Ticket,
        entries: Vec<FinancialEntry>,
        leads: Vec<Lead>,
        appointments: Vec<Appointment>,
    ) -> bool {
        if !ticket.is_current() {
            return false;
        }
        self.entries = entries;
        self.leads = leads;
        self.appointments = appointments;
        true
    }

    /// Replace the lead with the same id, or add it.
    pub fn upsert_lead(&mut self, lead: Lead) {
        match self.leads.iter_mut().find(|l| l.id == lead.id) {
            Some(existing) => *existing = lead,
            None => self.leads.insert(0, lead),
        }
    }

    pub fn push_entry(&mut self, entry: FinancialEntry) {
        self.entries.insert(0, entry);
    }

    /// Returns whether an entry with `id` was present.
    pub fn remove_entry(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }
}

/// Snapshot key of callers without a user id.
pub const ANONYMOUS_SESSION: &str = "anonymous";

pub fn snapshot_key(user: Option<&UserSession>) -> &str {
    user.and_then(|u| u.user_id.as_deref()).unwrap_or(ANONYMOUS_SESSION)
}

/// The [`DashboardSnapshot`] of every session, keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshots {
    sessions: Arc<Mutex<HashMap<String, DashboardSnapshot>>>,
}

impl SessionSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin_refresh(&self, key: &str) -> Ticket {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(key.to_string()).or_default().begin_refresh()
    }

    /// Returns whether the lists were applied; `false` means a newer refresh
    /// of the same session started after `ticket` was taken.
    pub async fn apply(
        &self,
        key: &str,
        ticket: &Ticket,
        entries: Vec<FinancialEntry>,
        leads: Vec<Lead>,
        appointments: Vec<Appointment>,
    ) -> bool {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(key.to_string())
            .or_default()
            .apply(ticket, entries, leads, appointments)
    }

    pub async fn upsert_lead(&self, key: &str, lead: Lead) {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(key.to_string()).or_default().upsert_lead(lead);
    }

    pub async fn push_entry(&self, key: &str, entry: FinancialEntry) {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(key.to_string()).or_default().push_entry(entry);
    }

    pub async fn remove_entry(&self, key: &str, id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        sessions
            .get_mut(key)
            .map(|snapshot| snapshot.remove_entry(id))
            .unwrap_or(false)
    }

    /// A copy of the session's snapshot; empty when the session is unknown.
    pub async fn snapshot(&self, key: &str) -> DashboardSnapshot {
        let sessions = self.sessions.lock().await;
        sessions.get(key).cloned().unwrap_or_default()
    }
}
