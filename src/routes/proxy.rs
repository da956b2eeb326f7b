//! Google Ads proxy and health routes.
//!
//! POST /api/google-ads - Forward `list_customers` / `get_campaigns` to Google Ads
//! GET  /health         - Liveness plus whether the developer token is set

use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::ApiError;
use crate::models::GoogleAdsProxyRequest;
use crate::sources::google_ads::ReportWindow;
use crate::state::AppState;

/// Build the proxy router.
pub fn router() -> Router {
    Router::new()
        .route("/api/google-ads", post(google_ads_proxy))
        .route("/health", get(health))
}

/// Run one Google Ads action with the server-held developer token.
///
/// The developer token never leaves the server. A configuration problem is a
/// 500, bad input a 400, and upstream failures keep the upstream status.
async fn google_ads_proxy(
    Extension(state): Extension<AppState>,
    Json(req): Json<GoogleAdsProxyRequest>,
) -> Result<Json<Value>, ApiError> {
    if !state.google_ads.developer_token_configured() {
        error!("Google Ads request rejected: developer token is not configured");
        return Err(ApiError::Configuration(
            "Google Ads developer token is not configured on the server".to_string(),
        ));
    }

    let access_token = required(req.access_token, "access_token")?;

    match req.action.as_str() {
        "list_customers" => {
            let customers = state
                .google_ads
                .list_customers(&access_token)
                .await
                .inspect_err(|e| error!("Google Ads list_customers failed: {}", e))?;
            info!("Listed {} accessible Google Ads customers", customers.len());
            Ok(Json(json!({ "customers": customers })))
        }
        "get_campaigns" => {
            let customer_id = required(req.customer_id, "customer_id")?;
            let window = ReportWindow::parse(req.date_range.as_deref());
            let campaigns = state
                .google_ads
                .campaigns(&access_token, &customer_id, &window)
                .await
                .inspect_err(|e| error!("Google Ads get_campaigns failed: {}", e))?;
            info!(
                "Fetched {} Google Ads campaigns for customer {}",
                campaigns.len(),
                customer_id
            );
            Ok(Json(json!({ "campaigns": campaigns })))
        }
        other => Err(ApiError::BadRequest(format!("Unknown action: {}", other))),
    }
}

async fn health(Extension(state): Extension<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "developerTokenConfigured": state.config.developer_token_configured(),
    }))
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}
