//! # Campaign Aggregation
//!
//! Merges campaign rows from the connected ad platforms into one normalized
//! list with per-campaign rates, per-channel summaries and overall totals.
//!
//! Platforms report in different units: Meta sends spend in currency units
//! and a `leads` count, Google Ads sends `cost_micros` and a fractional
//! `conversions` figure. Both become [`NormalizedCampaign::spend`] in currency
//! units and [`NormalizedCampaign::leads`].
//!
//! With no platform connected the report is filled from a fixed demo set and
//! flagged [`DataMode::Demo`]. A connected platform that returns no rows
//! yields an empty [`DataMode::Live`] report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Google Ads money fields are integer micro-units.
pub const MICROS_PER_UNIT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Meta,
    GoogleAds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    Live,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPolicy {
    /// Share of a channel's leads counted as qualified.
    pub qualified_lead_rate: f64,
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self {
            qualified_lead_rate: 0.3,
        }
    }
}

// ============================================================================
// Raw platform rows
// ============================================================================

/// One campaign row from the Meta insights endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaCampaignRow {
    pub campaign_id: String,
    pub campaign_name: String,
    pub status: Option<String>,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub leads: u64,
}

/// One campaign row from a Google Ads search, money in micros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleCampaignRow {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
    pub cost_micros: i64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
}

/// Rows delivered by one connected platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformRows {
    Meta(Vec<MetaCampaignRow>),
    GoogleAds(Vec<GoogleCampaignRow>),
}

impl PlatformRows {
    pub fn platform(&self) -> Platform {
        match self {
            PlatformRows::Meta(_) => Platform::Meta,
            PlatformRows::GoogleAds(_) => Platform::GoogleAds,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PlatformRows::Meta(rows) => rows.is_empty(),
            PlatformRows::GoogleAds(rows) => rows.is_empty(),
        }
    }

    fn normalize(self) -> Vec<NormalizedCampaign> {
        match self {
            PlatformRows::Meta(rows) => rows
                .into_iter()
                .map(|r| {
                    NormalizedCampaign::new(
                        Platform::Meta,
                        r.campaign_id,
                        r.campaign_name,
                        r.status,
                        r.spend,
                        r.impressions,
                        r.clicks,
                        r.leads as f64,
                    )
                })
                .collect(),
            PlatformRows::GoogleAds(rows) => rows
                .into_iter()
                .map(|r| {
                    NormalizedCampaign::new(
                        Platform::GoogleAds,
                        r.id,
                        r.name,
                        r.status,
                        r.cost_micros as f64 / MICROS_PER_UNIT,
                        r.impressions,
                        r.clicks,
                        r.conversions,
                    )
                })
                .collect(),
        }
    }
}

// ============================================================================
// Aggregated output
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCampaign {
    pub platform: Platform,
    pub id: String,
    pub name: String,
    pub status: Option<String>,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub leads: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpl: f64,
}

impl NormalizedCampaign {
    #[allow(clippy::too_many_arguments)]
    fn new(
        platform: Platform,
        id: String,
        name: String,
        status: Option<String>,
        spend: f64,
        impressions: u64,
        clicks: u64,
        leads: f64,
    ) -> Self {
        Self {
            platform,
            id,
            name,
            status,
            spend,
            impressions,
            clicks,
            leads,
            ctr: percent(clicks as f64, impressions as f64),
            cpc: safe_div(spend, clicks as f64),
            cpl: safe_div(spend, leads),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub platform: Platform,
    pub campaigns: usize,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub leads: f64,
    pub cpl: f64,
    pub qualified_leads: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTotals {
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub leads: f64,
    pub qualified_leads: u64,
    pub ctr: f64,
    pub cpl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignReport {
    pub mode: DataMode,
    pub campaigns: Vec<NormalizedCampaign>,
    pub channels: Vec<ChannelSummary>,
    pub totals: CampaignTotals,
}

impl CampaignReport {
    pub fn is_demo(&self) -> bool {
        self.mode == DataMode::Demo
    }
}

/// Aggregate the rows of every connected platform.
///
/// `connected` holds one entry per connected platform, even when that
/// platform returned nothing for the period.
pub fn aggregate(connected: Vec<PlatformRows>, policy: &ChannelPolicy) -> CampaignReport {
    let (mode, sources) = if connected.is_empty() {
        (DataMode::Demo, demo_rows())
    } else {
        (DataMode::Live, connected)
    };

    let campaigns: Vec<NormalizedCampaign> = sources
        .into_iter()
        .flat_map(PlatformRows::normalize)
        .collect();

    let mut by_platform: BTreeMap<Platform, Vec<&NormalizedCampaign>> = BTreeMap::new();
    for campaign in &campaigns {
        by_platform.entry(campaign.platform).or_default().push(campaign);
    }

    let channels: Vec<ChannelSummary> = by_platform
        .into_iter()
        .map(|(platform, rows)| summarize_channel(platform, &rows, policy))
        .collect();

    let totals = totals(&campaigns, &channels);

    CampaignReport {
        mode,
        campaigns,
        channels,
        totals,
    }
}

fn summarize_channel(
    platform: Platform,
    rows: &[&NormalizedCampaign],
    policy: &ChannelPolicy,
) -> ChannelSummary {
    let spend: f64 = rows.iter().map(|c| c.spend).sum();
    let leads: f64 = rows.iter().map(|c| c.leads).sum();
    ChannelSummary {
        platform,
        campaigns: rows.len(),
        spend,
        impressions: rows.iter().map(|c| c.impressions).sum(),
        clicks: rows.iter().map(|c| c.clicks).sum(),
        leads,
        cpl: safe_div(spend, leads),
        qualified_leads: (leads * policy.qualified_lead_rate).round().max(0.0) as u64,
    }
}

fn totals(campaigns: &[NormalizedCampaign], channels: &[ChannelSummary]) -> CampaignTotals {
    let spend: f64 = campaigns.iter().map(|c| c.spend).sum();
    let impressions: u64 = campaigns.iter().map(|c| c.impressions).sum();
    let clicks: u64 = campaigns.iter().map(|c| c.clicks).sum();
    let leads: f64 = campaigns.iter().map(|c| c.leads).sum();
    CampaignTotals {
        spend,
        impressions,
        clicks,
        leads,
        qualified_leads: channels.iter().map(|c| c.qualified_leads).sum(),
        ctr: percent(clicks as f64, impressions as f64),
        cpl: safe_div(spend, leads),
    }
}

/// Fixed showcase campaigns used while no ad account is connected.
pub fn demo_rows() -> Vec<PlatformRows> {
    vec![
        PlatformRows::Meta(vec![
            MetaCampaignRow {
                campaign_id: "demo-meta-1".into(),
                campaign_name: "Facial Harmonization - Leads".into(),
                status: Some("ACTIVE".into()),
                spend: 1250.0,
                impressions: 48_000,
                clicks: 920,
                leads: 64,
            },
            MetaCampaignRow {
                campaign_id: "demo-meta-2".into(),
                campaign_name: "Botox - Remarketing".into(),
                status: Some("ACTIVE".into()),
                spend: 640.0,
                impressions: 21_000,
                clicks: 410,
                leads: 27,
            },
        ]),
        PlatformRows::GoogleAds(vec![
            GoogleCampaignRow {
                id: "demo-google-1".into(),
                name: "Search - Dental Implants".into(),
                status: Some("ENABLED".into()),
                cost_micros: 1_830_000_000,
                impressions: 15_000,
                clicks: 780,
                conversions: 41.0,
            },
            GoogleCampaignRow {
                id: "demo-google-2".into(),
                name: "Brand Search".into(),
                status: Some("ENABLED".into()),
                cost_micros: 320_000_000,
                impressions: 5_200,
                clicks: 610,
                conversions: 22.0,
            },
        ]),
    ]
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    safe_div(part, whole) * 100.0
}
