//! Google Calendar events materialized as read-only appointments.
//!
//! Events are fetched for the active period on every refresh and merged into
//! the local appointment list in memory; they are never written to the store.

use chrono::{DateTime, Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::analytics::date_range::DateRange;
use crate::error::UpstreamError;
use crate::models::{Appointment, AppointmentStatus};
use crate::session::CalendarConnection;
use crate::sources::upstream::read_json;

const SERVICE: &str = "Google Calendar";

/// Time label given to all-day events.
pub const ALL_DAY: &str = "All day";
/// Appointment type tag for calendar-sourced appointments.
pub const CALENDAR_KIND: &str = "Google Calendar";
pub const CALENDAR_ID_PREFIX: &str = "google-";

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start: EventTime,
}

/// Either `dateTime` (timed event, RFC 3339) or `date` (all-day event).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Convert a calendar event into an appointment.
///
/// Timed events keep the wall-clock date and `HH:MM` of their own offset.
/// Events with neither start form are dropped.
pub fn normalize_event(event: CalendarEvent) -> Option<Appointment> {
    let (date, time) = match (&event.start.date_time, event.start.date) {
        (Some(raw), _) => {
            let start = DateTime::parse_from_rfc3339(raw).ok()?;
            (start.date_naive(), start.format("%H:%M").to_string())
        }
        (None, Some(date)) => (date, ALL_DAY.to_string()),
        (None, None) => return None,
    };

    let status = match event.status.as_deref() {
        Some("cancelled") => AppointmentStatus::Cancelled,
        _ => AppointmentStatus::Confirmed,
    };

    Some(Appointment {
        id: format!("{}{}", CALENDAR_ID_PREFIX, event.id),
        date,
        time,
        patient_name: event
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "(no title)".to_string()),
        kind: CALENDAR_KIND.to_string(),
        status,
        is_google: true,
    })
}

/// Local appointments plus calendar appointments, sorted by date and time.
/// A calendar appointment whose id is already present locally is skipped.
pub fn merge_appointments(local: Vec<Appointment>, calendar: Vec<Appointment>) -> Vec<Appointment> {
    let mut merged = local;
    for appointment in calendar {
        if !merged.iter().any(|a| a.id == appointment.id) {
            merged.push(appointment);
        }
    }
    merged.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
    merged
}

#[derive(Debug, Clone)]
pub struct CalendarClient {
    http: Client,
    base_url: String,
}

impl CalendarClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Events of the primary calendar whose own-offset start date falls in
    /// `range`.
    ///
    /// The query window is padded by a day on each side; events are then cut
    /// to `range` by their local date.
    pub async fn events(
        &self,
        connection: &CalendarConnection,
        range: &DateRange,
    ) -> Result<Vec<Appointment>, UpstreamError> {
        let time_min = utc_midnight(range.start - Duration::days(1));
        let time_max = utc_midnight(range.end + Duration::days(2));

        let response = self
            .http
            .get(format!("{}/calendars/primary/events", self.base_url))
            .bearer_auth(&connection.access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", "250"),
            ])
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;

        let list: EventList = read_json(SERVICE, response).await?;
        let total = list.items.len();
        let appointments: Vec<Appointment> = list
            .items
            .into_iter()
            .filter_map(normalize_event)
            .filter(|a| range.contains(a.date))
            .collect();
        debug!("Calendar returned {} events, {} usable", total, appointments.len());
        Ok(appointments)
    }
}

fn utc_midnight(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}
