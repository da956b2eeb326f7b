//! Shared application state handed to every route through `Extension`.
//!
//! Usage in route handlers:
//! ```ignore
//! async fn my_handler(
//!     Extension(state): Extension<AppState>,
//! ) -> impl IntoResponse {
//!     // state.store, state.google_ads, state.snapshots, ...
//! }
//! ```

use std::sync::Arc;

use crate::config::AppConfig;
use crate::session::SessionSnapshots;
use crate::sources::calendar::CalendarClient;
use crate::sources::google_ads::GoogleAdsClient;
use crate::sources::meta::MetaAdsClient;
use crate::sources::store::StoreClient;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: StoreClient,
    pub google_ads: GoogleAdsClient,
    pub meta: MetaAdsClient,
    pub calendar: CalendarClient,
    pub snapshots: SessionSnapshots,
}

impl AppState {
    /// Build every outbound client from `config`, sharing one HTTP pool.
    pub fn from_config(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            store: StoreClient::new(
                http.clone(),
                config.store_url.clone(),
                config.store_key.clone(),
            ),
            google_ads: GoogleAdsClient::new(
                http.clone(),
                config.google_ads_api_url.clone(),
                config.google_ads_developer_token.clone(),
                config.google_ads_login_customer_id.clone(),
            ),
            meta: MetaAdsClient::new(http.clone(), config.meta_graph_url.clone()),
            calendar: CalendarClient::new(http, config.google_calendar_url.clone()),
            snapshots: SessionSnapshots::new(),
            config: Arc::new(config),
        })
    }
}
