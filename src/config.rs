//! Runtime configuration read from the environment.
//!
//! `main` loads a `.env` file with `dotenvy` first, so every key below may be
//! set either way. Secrets (the Google Ads developer token, the store key) stay
//! on the server and are never echoed back to clients.

use std::time::Duration;

use crate::analytics::campaigns::ChannelPolicy;
use crate::analytics::consolidate::MetricsPolicy;
use crate::error::ConfigError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_GOOGLE_ADS_API_URL: &str = "https://googleads.googleapis.com/v18";
pub const DEFAULT_META_GRAPH_URL: &str = "https://graph.facebook.com/v19.0";
pub const DEFAULT_GOOGLE_CALENDAR_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_TICKET_VALUE: f64 = 450.0;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub google_ads_developer_token: Option<String>,
    pub google_ads_login_customer_id: Option<String>,
    pub google_ads_api_url: String,
    pub meta_graph_url: String,
    pub google_calendar_url: String,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub default_ticket_value: f64,
    pub metrics_policy: MetricsPolicy,
    pub channel_policy: ChannelPolicy,
    pub upstream_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            google_ads_developer_token: None,
            google_ads_login_customer_id: None,
            google_ads_api_url: DEFAULT_GOOGLE_ADS_API_URL.to_string(),
            meta_graph_url: DEFAULT_META_GRAPH_URL.to_string(),
            google_calendar_url: DEFAULT_GOOGLE_CALENDAR_URL.to_string(),
            store_url: None,
            store_key: None,
            default_ticket_value: DEFAULT_TICKET_VALUE,
            metrics_policy: MetricsPolicy::default(),
            channel_policy: ChannelPolicy::default(),
            upstream_timeout: Duration::from_secs(15),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let metrics_policy = MetricsPolicy {
            estimated_cost_per_lead: parse_var(
                "ESTIMATED_COST_PER_LEAD",
                defaults.metrics_policy.estimated_cost_per_lead,
            )?,
            ..defaults.metrics_policy
        };
        let channel_policy = ChannelPolicy {
            qualified_lead_rate: parse_var(
                "QUALIFIED_LEAD_RATE",
                defaults.channel_policy.qualified_lead_rate,
            )?,
        };

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            google_ads_developer_token: optional_var("GOOGLE_ADS_DEVELOPER_TOKEN"),
            google_ads_login_customer_id: optional_var("GOOGLE_ADS_LOGIN_CUSTOMER_ID"),
            google_ads_api_url: std::env::var("GOOGLE_ADS_API_URL")
                .unwrap_or(defaults.google_ads_api_url),
            meta_graph_url: std::env::var("META_GRAPH_URL").unwrap_or(defaults.meta_graph_url),
            google_calendar_url: std::env::var("GOOGLE_CALENDAR_URL")
                .unwrap_or(defaults.google_calendar_url),
            store_url: optional_var("SUPABASE_URL"),
            store_key: optional_var("SUPABASE_ANON_KEY"),
            default_ticket_value: parse_var("DEFAULT_TICKET_VALUE", defaults.default_ticket_value)?,
            metrics_policy,
            channel_policy,
            upstream_timeout: Duration::from_secs(parse_var("UPSTREAM_TIMEOUT_SECS", 15u64)?),
        })
    }

    pub fn developer_token_configured(&self) -> bool {
        self.google_ads_developer_token.is_some()
    }
}

/// Unset and blank values are both treated as absent.
fn optional_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
