//! # Clinic Dashboard Server
//!
//! Serves the dashboard KPI endpoints and the Google Ads proxy.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and request/response lifecycle
//! - Records live in an external managed store reached over REST
//! - Ad platforms and the calendar are called with the user's own tokens;
//!   only the Google Ads developer token is held by this process

use clinic_dashboard::config::AppConfig;
use clinic_dashboard::create_app;
use clinic_dashboard::state::AppState;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_dashboard=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting clinic dashboard server");

    let config = AppConfig::from_env()?;
    if config.developer_token_configured() {
        info!("Google Ads developer token configured");
    } else {
        warn!("GOOGLE_ADS_DEVELOPER_TOKEN is not set; Google Ads requests will fail");
    }
    if config.store_url.is_none() || config.store_key.is_none() {
        warn!("SUPABASE_URL / SUPABASE_ANON_KEY not set; dashboards will use sample data");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::from_config(config)?;
    let app = create_app(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
