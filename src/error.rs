//! Error types for the dashboard library and its HTTP surface.
//!
//! Upstream failures (store, ad platforms, calendar) are described by
//! [`UpstreamError`]. Fetchers absorb them into fallback data; only the
//! Google Ads proxy route turns them into an HTTP error via [`ApiError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Maximum number of characters of an upstream body echoed back in errors.
pub const SNIPPET_LEN: usize = 200;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} returned a non-JSON response (status {status}): {snippet}")]
    Malformed {
        service: &'static str,
        status: u16,
        snippet: String,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl UpstreamError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } | UpstreamError::Malformed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Errors reading [`crate::config::AppConfig`] from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors returned to HTTP callers as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(UpstreamError::NotConfigured(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Upstream(UpstreamError::Status { status, .. }) => {
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Truncate an upstream body to [`SNIPPET_LEN`] characters.
pub fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
