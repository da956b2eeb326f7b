//! Google Ads REST client.
//!
//! Every call needs the user's OAuth access token plus the server-held
//! developer token, which is why browser clients go through the
//! `/api/google-ads` proxy route instead of calling Google directly.

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::analytics::campaigns::GoogleCampaignRow;
use crate::analytics::date_range::DateRange;
use crate::error::UpstreamError;
use crate::sources::upstream::{flexible, parse_body, read_body, read_json};

const SERVICE: &str = "Google Ads API";
const CUSTOMER_NOT_FOUND: &str = "CUSTOMER_NOT_FOUND";

/// GAQL `DURING` literals accepted from clients.
const DURING_PRESETS: &[&str] = &[
    "TODAY",
    "YESTERDAY",
    "LAST_7_DAYS",
    "LAST_14_DAYS",
    "LAST_30_DAYS",
    "THIS_WEEK_SUN_TODAY",
    "THIS_WEEK_MON_TODAY",
    "LAST_WEEK_SUN_SAT",
    "LAST_WEEK_MON_SUN",
    "THIS_MONTH",
    "LAST_MONTH",
];
const DEFAULT_PRESET: &str = "LAST_30_DAYS";

/// Date filter of a campaign report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportWindow {
    During(&'static str),
    Between(NaiveDate, NaiveDate),
}

impl ReportWindow {
    /// Parse the proxy's `date_range` field: a GAQL preset such as
    /// `LAST_7_DAYS`, or `YYYY-MM-DD,YYYY-MM-DD`. Anything else, including a
    /// missing value, means the last 30 days.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return ReportWindow::During(DEFAULT_PRESET);
        };
        let upper = raw.to_ascii_uppercase();
        if let Some(preset) = DURING_PRESETS.iter().find(|p| **p == upper) {
            return ReportWindow::During(*preset);
        }
        if let Some((start, end)) = raw.split_once(',') {
            if let (Ok(start), Ok(end)) = (
                NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d"),
                NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d"),
            ) {
                if start <= end {
                    return ReportWindow::Between(start, end);
                }
            }
        }
        ReportWindow::During(DEFAULT_PRESET)
    }

    fn condition(&self) -> String {
        match self {
            ReportWindow::During(preset) => format!("segments.date DURING {}", preset),
            ReportWindow::Between(start, end) => format!(
                "segments.date BETWEEN '{}' AND '{}'",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
        }
    }
}

impl From<&DateRange> for ReportWindow {
    fn from(range: &DateRange) -> Self {
        ReportWindow::Between(range.start, range.end)
    }
}

pub fn campaign_query(window: &ReportWindow) -> String {
    format!(
        "SELECT campaign.id, campaign.name, campaign.status, metrics.impressions, \
         metrics.clicks, metrics.cost_micros, metrics.conversions \
         FROM campaign WHERE {} AND campaign.status != 'REMOVED'",
        window.condition()
    )
}

/// An ads account reachable with the caller's token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: String,
    pub resource_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessibleCustomers {
    #[serde(default)]
    resource_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchRow>,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    campaign: CampaignFields,
    #[serde(default)]
    metrics: MetricFields,
}

#[derive(Debug, Deserialize)]
struct CampaignFields {
    #[serde(deserialize_with = "flexible::id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: Option<String>,
}

/// Zero-valued metrics are omitted from the JSON mapping entirely.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricFields {
    #[serde(default, deserialize_with = "flexible::u64")]
    impressions: u64,
    #[serde(default, deserialize_with = "flexible::u64")]
    clicks: u64,
    #[serde(default, deserialize_with = "flexible::i64")]
    cost_micros: i64,
    #[serde(default, deserialize_with = "flexible::f64")]
    conversions: f64,
}

impl From<SearchRow> for GoogleCampaignRow {
    fn from(row: SearchRow) -> Self {
        GoogleCampaignRow {
            id: row.campaign.id,
            name: row.campaign.name,
            status: row.campaign.status,
            cost_micros: row.metrics.cost_micros,
            impressions: row.metrics.impressions,
            clicks: row.metrics.clicks,
            conversions: row.metrics.conversions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleAdsClient {
    http: Client,
    base_url: String,
    developer_token: Option<String>,
    login_customer_id: Option<String>,
}

impl GoogleAdsClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        developer_token: Option<String>,
        login_customer_id: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            developer_token,
            login_customer_id: login_customer_id.map(|id| digits(&id)),
        }
    }

    pub fn developer_token_configured(&self) -> bool {
        self.developer_token.is_some()
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        access_token: &str,
    ) -> Result<reqwest::RequestBuilder, UpstreamError> {
        let developer_token = self
            .developer_token
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("Google Ads developer token"))?;
        let mut builder = self
            .http
            .request(method, format!("{}/{}", self.base_url, path))
            .bearer_auth(access_token)
            .header("developer-token", developer_token);
        if let Some(login) = &self.login_customer_id {
            builder = builder.header("login-customer-id", login);
        }
        Ok(builder)
    }

    pub async fn list_customers(&self, access_token: &str) -> Result<Vec<Customer>, UpstreamError> {
        let response = self
            .request(
                reqwest::Method::GET,
                "customers:listAccessibleCustomers",
                access_token,
            )?
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;

        let body: AccessibleCustomers = read_json(SERVICE, response).await?;
        Ok(body
            .resource_names
            .into_iter()
            .map(|resource_name| Customer {
                id: resource_name
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string(),
                resource_name,
            })
            .collect())
    }

    /// Campaign metrics of one customer for `window`.
    ///
    /// A customer id unknown to Google yields an empty list rather than an
    /// error: freshly linked accounts commonly hit this.
    pub async fn campaigns(
        &self,
        access_token: &str,
        customer_id: &str,
        window: &ReportWindow,
    ) -> Result<Vec<GoogleCampaignRow>, UpstreamError> {
        let customer_id = digits(customer_id);
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("customers/{}/googleAds:search", customer_id),
                access_token,
            )?
            .json(&json!({ "query": campaign_query(window) }))
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;

        let (status, body) = read_body(SERVICE, response).await?;
        if !status.is_success() && body.contains(CUSTOMER_NOT_FOUND) {
            info!("Google Ads customer {} not found, returning no campaigns", customer_id);
            return Ok(Vec::new());
        }

        let search: SearchResponse = parse_body(SERVICE, status, &body)?;
        debug!(
            "Google Ads returned {} campaign rows for customer {}",
            search.results.len(),
            customer_id
        );
        Ok(search.results.into_iter().map(GoogleCampaignRow::from).collect())
    }
}

/// Customer ids are shown as `123-456-7890` but the API wants digits only.
fn digits(id: &str) -> String {
    id.chars().filter(char::is_ascii_digit).collect()
}
