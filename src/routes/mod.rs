//! HTTP route modules.
//!
//! - `proxy`: Google Ads proxy and health check
//! - `dashboard`: consolidated KPIs and campaign report
//! - `records`: lead stage changes and financial entry creation

pub mod dashboard;
pub mod proxy;
pub mod records;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::session::UserSession;

/// Header carrying the signed-in user's id, used as the row owner on inserts.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's store session, taken from `Authorization: Bearer <token>`.
pub fn session_from_headers(headers: &HeaderMap) -> Option<UserSession> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();
    if token.is_empty() {
        return None;
    }
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    Some(UserSession {
        access_token: token.to_string(),
        user_id,
    })
}
