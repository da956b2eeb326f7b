//! Record write routes.
//!
//! POST   /api/leads/{id}/stage - Move a lead to another pipeline stage
//! POST   /api/entries          - Create a financial entry (e.g. a confirmed sale proposal)
//! DELETE /api/entries/{id}     - Delete a financial entry
//!
//! Writes are optimistic: the change is applied to the session snapshot, the
//! response is produced, and the store write runs in the background. A failed
//! write is logged and not rolled back.

use std::future::Future;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, post};
use axum::{Extension, Json, Router};
use chrono::Local;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, UpstreamError};
use crate::models::{
    ApiResponse, CreateEntryRequest, FinancialEntry, Lead, StageChangeRequest,
    StageChangeResponse,
};
use crate::pipeline::{change_stage, evaluate_stage_change};
use crate::routes::session_from_headers;
use crate::session::{snapshot_key, AppContext};
use crate::sources::samples::SAMPLE_ID_PREFIX;
use crate::state::AppState;

/// Build the records router.
pub fn router() -> Router {
    Router::new()
        .route("/api/leads/{id}/stage", post(change_lead_stage))
        .route("/api/entries", post(create_entry))
        .route("/api/entries/{id}", delete(delete_entry))
}

/// Apply a stage change and return the resulting event and, for a new sale,
/// the proposed receivable for the caller to confirm.
async fn change_lead_stage(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<StageChangeRequest>,
) -> Result<Json<ApiResponse<StageChangeResponse>>, ApiError> {
    if req.lead.id != id {
        return Err(ApiError::BadRequest(format!(
            "Lead id {} does not match path id {}",
            req.lead.id, id
        )));
    }

    let ctx = AppContext::new(req.ticket_value.unwrap_or(state.config.default_ticket_value))
        .with_user(session_from_headers(&headers));
    let today = Local::now().date_naive();

    let (lead, event) = change_stage(&req.lead, req.to);
    let proposal = event
        .as_ref()
        .and_then(|e| evaluate_stage_change(e, &lead, &ctx, today));

    match &event {
        Some(e) => {
            info!("Lead {} moved from {:?} to {:?}", e.lead_id, e.from, e.to);
            state
                .snapshots
                .upsert_lead(snapshot_key(ctx.user()), lead.clone())
                .await;
            let store = state.store.clone();
            let session = ctx.user().cloned();
            let record = lead.clone();
            persist_in_background(format!("lead {}", lead.id), async move {
                store.update::<Lead>(&record, session.as_ref()).await
            });
        }
        None => debug!("Lead {} already in stage {:?}", lead.id, lead.status),
    }
    if proposal.is_some() {
        info!("Lead {} closed a sale, proposing a receivable", lead.id);
    }

    Ok(Json(ApiResponse {
        data: StageChangeResponse {
            lead,
            event,
            proposal,
        },
        message: "Lead stage updated".to_string(),
    }))
}

/// Create a financial entry from a draft; the total is derived here.
async fn create_entry(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FinancialEntry>>), ApiError> {
    let draft = req.draft;
    if draft.unit_value < 0.0 || draft.discount < 0.0 || draft.addition < 0.0 {
        return Err(ApiError::BadRequest(
            "unitValue, discount and addition must not be negative".to_string(),
        ));
    }

    let entry = FinancialEntry::new(Uuid::new_v4().to_string(), draft);
    info!(
        "Financial entry {} created: {} {:.2}",
        entry.id, entry.category, entry.total
    );

    let session = session_from_headers(&headers);
    state
        .snapshots
        .push_entry(snapshot_key(session.as_ref()), entry.clone())
        .await;

    let store = state.store.clone();
    let record = entry.clone();
    persist_in_background(format!("financial entry {}", entry.id), async move {
        store.insert::<FinancialEntry>(&record, session.as_ref()).await
    });

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: entry,
            message: "Financial entry created".to_string(),
        }),
    ))
}

/// Remove a financial entry. Sample entries only exist in the snapshot and
/// are never sent to the store.
async fn delete_entry(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    let session = session_from_headers(&headers);
    if state
        .snapshots
        .remove_entry(snapshot_key(session.as_ref()), &id)
        .await
    {
        debug!("Financial entry {} removed from session snapshot", id);
    }
    info!("Financial entry {} deleted", id);

    if id.starts_with(SAMPLE_ID_PREFIX) {
        debug!("Financial entry {} is sample data, skipping store delete", id);
        return StatusCode::NO_CONTENT;
    }

    let store = state.store.clone();
    persist_in_background(format!("deletion of financial entry {}", id), async move {
        store.delete::<FinancialEntry>(&id, session.as_ref()).await
    });

    StatusCode::NO_CONTENT
}

/// Run a store write after the response has been produced.
fn persist_in_background<F>(what: String, write: F)
where
    F: Future<Output = Result<(), UpstreamError>> + Send + 'static,
{
    tokio::spawn(async move {
        match write.await {
            Ok(()) => debug!("Persisted {}", what),
            Err(UpstreamError::NotConfigured(service)) => {
                warn!("Not persisting {}: {} is not configured", what, service)
            }
            Err(e) => error!("Failed to persist {}: {}", what, e),
        }
    });
}
