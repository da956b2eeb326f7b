//! Meta Marketing API client (campaign-level insights).

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::analytics::campaigns::MetaCampaignRow;
use crate::analytics::date_range::DateRange;
use crate::error::UpstreamError;
use crate::session::MetaConnection;
use crate::sources::upstream::{flexible, read_json};

const SERVICE: &str = "Meta Graph API";
const LEAD_ACTION: &str = "lead";
const INSIGHT_FIELDS: &str = "campaign_id,campaign_name,spend,impressions,clicks,actions";

#[derive(Debug, Deserialize)]
struct InsightsPage {
    #[serde(default)]
    data: Vec<InsightRow>,
}

#[derive(Debug, Deserialize)]
struct InsightRow {
    campaign_id: String,
    #[serde(default)]
    campaign_name: String,
    #[serde(default, deserialize_with = "flexible::f64")]
    spend: f64,
    #[serde(default, deserialize_with = "flexible::u64")]
    impressions: u64,
    #[serde(default, deserialize_with = "flexible::u64")]
    clicks: u64,
    #[serde(default)]
    actions: Vec<ActionValue>,
}

#[derive(Debug, Deserialize)]
struct ActionValue {
    action_type: String,
    #[serde(default, deserialize_with = "flexible::f64")]
    value: f64,
}

impl From<InsightRow> for MetaCampaignRow {
    fn from(row: InsightRow) -> Self {
        let leads = row
            .actions
            .iter()
            .filter(|a| a.action_type == LEAD_ACTION)
            .map(|a| a.value)
            .sum::<f64>()
            .round()
            .max(0.0) as u64;
        MetaCampaignRow {
            campaign_id: row.campaign_id,
            campaign_name: row.campaign_name,
            status: None,
            spend: row.spend,
            impressions: row.impressions,
            clicks: row.clicks,
            leads,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetaAdsClient {
    http: Client,
    base_url: String,
}

impl MetaAdsClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Campaign insights of one ad account for `range`.
    pub async fn campaign_insights(
        &self,
        connection: &MetaConnection,
        range: &DateRange,
    ) -> Result<Vec<MetaCampaignRow>, UpstreamError> {
        let account = connection
            .ad_account_id
            .trim()
            .trim_start_matches("act_")
            .to_string();
        let time_range = json!({
            "since": range.start.format("%Y-%m-%d").to_string(),
            "until": range.end.format("%Y-%m-%d").to_string(),
        })
        .to_string();

        let response = self
            .http
            .get(format!("{}/act_{}/insights", self.base_url, account))
            .query(&[
                ("level", "campaign"),
                ("fields", INSIGHT_FIELDS),
                ("time_range", time_range.as_str()),
                ("limit", "500"),
                ("access_token", connection.access_token.as_str()),
            ])
            .send()
            .await
            // The access token travels in the query string; keep it out of logs.
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source: source.without_url(),
            })?;

        let page: InsightsPage = read_json(SERVICE, response).await?;
        debug!("Meta returned {} campaign rows for act_{}", page.data.len(), account);
        Ok(page.data.into_iter().map(MetaCampaignRow::from).collect())
    }
}
