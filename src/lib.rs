//! # Clinic Dashboard Library
//!
//! Consolidates financial entries, leads, appointments and ad-platform
//! campaigns into dashboard KPIs, and proxies Google Ads calls that need the
//! server-held developer token.
//!
//! Exposes the Axum router and modules so integration tests can create an
//! in-process server without running the binary.

pub mod analytics;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod session;
pub mod sources;
pub mod state;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all route modules and middleware.
///
/// This function does NOT bind a listener; the caller serves the router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::proxy::router())
        .merge(routes::dashboard::router())
        .merge(routes::records::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
