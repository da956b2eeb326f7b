//! Named reporting periods and the closed date intervals they resolve to.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The preset periods offered by the dashboard filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Last7Days,
    Last30Days,
    ThisYear,
}

impl Period {
    /// Parse a filter label. Unrecognised labels fall back to the 30-day period.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "today" => Period::Today,
            "7 days" => Period::Last7Days,
            "30 days" => Period::Last30Days,
            "this year" => Period::ThisYear,
            _ => Period::Last30Days,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Today => "Today",
            Period::Last7Days => "7 days",
            Period::Last30Days => "30 days",
            Period::ThisYear => "This Year",
        }
    }

    pub fn range(self, now: NaiveDate) -> DateRange {
        let start = match self {
            Period::Today => now,
            Period::Last7Days => now - Duration::days(7),
            Period::Last30Days => now - Duration::days(30),
            Period::ThisYear => NaiveDate::from_ymd_opt(now.year(), 1, 1).unwrap_or(now),
        };
        DateRange {
            start,
            end: now,
            label: self.label().to_string(),
        }
    }
}

/// A closed interval of calendar dates: `start <= d <= end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Resolve a filter label against `now`.
pub fn resolve(label: &str, now: NaiveDate) -> DateRange {
    Period::from_label(label).range(now)
}
