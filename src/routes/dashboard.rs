//! Dashboard KPI routes.
//!
//! POST /api/dashboard/metrics   - Consolidated marketing, sales and financial KPIs
//! POST /api/dashboard/campaigns - Campaign report across connected ad platforms
//! GET  /api/dashboard/snapshot  - Lists the caller's dashboard last loaded, with local edits
//!
//! The POST routes always answer 200: upstream failures degrade to sample data
//! (metrics) or to an empty platform (campaigns) and are only logged.

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::analytics::campaigns::{aggregate, PlatformRows};
use crate::analytics::consolidate::consolidate;
use crate::analytics::date_range::{resolve, DateRange};
use crate::models::{
    ApiResponse, Appointment, CampaignsRequest, CampaignsResponse, FinancialEntry, Lead,
    MetricsRequest, MetricsResponse, SourceOrigins,
};
use crate::routes::session_from_headers;
use crate::session::{
    snapshot_key, AppContext, CalendarConnection, DashboardSnapshot, GoogleAdsConnection,
    MetaConnection,
};
use crate::sources::calendar::merge_appointments;
use crate::sources::fetch_with_fallback;
use crate::sources::google_ads::ReportWindow;
use crate::sources::store::StoreSource;
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router {
    Router::new()
        .route("/api/dashboard/metrics", post(dashboard_metrics))
        .route("/api/dashboard/campaigns", post(dashboard_campaigns))
        .route("/api/dashboard/snapshot", get(dashboard_snapshot))
}

fn today_or(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

/// Fetch the three entity lists (plus calendar events when a calendar token
/// is supplied) and consolidate them for the requested period.
///
/// The fetched lists replace the session snapshot unless a newer refresh of
/// the same session started meanwhile; the response is then flagged `stale`.
async fn dashboard_metrics(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(req): Json<MetricsRequest>,
) -> Json<ApiResponse<MetricsResponse>> {
    let today = today_or(req.as_of);
    let ctx = AppContext::new(req.ticket_value.unwrap_or(state.config.default_ticket_value))
        .with_user(session_from_headers(&headers))
        .with_calendar(
            req.calendar_token
                .filter(|t| !t.trim().is_empty())
                .map(|access_token| CalendarConnection { access_token }),
        );
    let range = resolve(&req.period, today);
    let key = snapshot_key(ctx.user()).to_string();
    let ticket = state.snapshots.begin_refresh(&key).await;
    debug!("Refresh {} started for session {}", ticket.id(), key);

    let entries_source = StoreSource::<FinancialEntry>::new(&state.store, ctx.user(), today);
    let leads_source = StoreSource::<Lead>::new(&state.store, ctx.user(), today);
    let appointments_source = StoreSource::<Appointment>::new(&state.store, ctx.user(), today);

    let (entries, leads, appointments, calendar) = tokio::join!(
        fetch_with_fallback(&entries_source),
        fetch_with_fallback(&leads_source),
        fetch_with_fallback(&appointments_source),
        calendar_appointments(&state, &ctx, &range),
    );

    let origins = SourceOrigins {
        entries: entries.origin,
        leads: leads.origin,
        appointments: appointments.origin,
        calendar_events: calendar.len(),
    };
    let appointments = merge_appointments(appointments.records, calendar);

    let metrics = consolidate(
        &entries.records,
        &leads.records,
        &appointments,
        &range,
        ctx.ticket_value(),
        &state.config.metrics_policy,
    );

    info!(
        "Consolidated metrics for {} ({} to {}, {} days): revenue {:.2}, {} leads, {} scheduled",
        range.label,
        range.start,
        range.end,
        range.days(),
        metrics.marketing.gross_revenue,
        metrics.marketing.leads_in_period,
        metrics.sales.scheduled
    );

    let applied = state
        .snapshots
        .apply(&key, &ticket, entries.records, leads.records, appointments)
        .await;
    let message = if applied {
        "Metrics consolidated"
    } else {
        info!(
            "Refresh {} for session {} was superseded, keeping the newer snapshot",
            ticket.id(),
            key
        );
        "Metrics consolidated from a superseded refresh"
    };

    Json(ApiResponse {
        data: MetricsResponse {
            range,
            metrics,
            origins,
            stale: !applied,
        },
        message: message.to_string(),
    })
}

/// The caller's current snapshot; empty lists before the first refresh.
async fn dashboard_snapshot(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Json<ApiResponse<DashboardSnapshot>> {
    let session = session_from_headers(&headers);
    let snapshot = state
        .snapshots
        .snapshot(snapshot_key(session.as_ref()))
        .await;
    Json(ApiResponse {
        data: snapshot,
        message: "Dashboard snapshot".to_string(),
    })
}

async fn calendar_appointments(
    state: &AppState,
    ctx: &AppContext,
    range: &DateRange,
) -> Vec<Appointment> {
    let Some(connection) = &ctx.integrations().calendar else {
        return Vec::new();
    };
    match state.calendar.events(connection, range).await {
        Ok(appointments) => appointments,
        Err(e) => {
            warn!("Failed to fetch calendar events, continuing without them: {}", e);
            Vec::new()
        }
    }
}

/// Aggregate campaigns of the platforms connected in the request body.
async fn dashboard_campaigns(
    Extension(state): Extension<AppState>,
    Json(req): Json<CampaignsRequest>,
) -> Json<ApiResponse<CampaignsResponse>> {
    let today = today_or(req.as_of);
    let ctx = AppContext::new(state.config.default_ticket_value)
        .with_meta(req.meta.map(|m| MetaConnection {
            access_token: m.access_token,
            ad_account_id: m.ad_account_id,
        }))
        .with_google_ads(req.google_ads.map(|g| GoogleAdsConnection {
            access_token: g.access_token,
            customer_id: g.customer_id,
        }));
    let range = resolve(&req.period, today);

    let (meta, google_ads) = tokio::join!(
        meta_rows(&state, ctx.integrations().meta.as_ref(), &range),
        google_ads_rows(&state, ctx.integrations().google_ads.as_ref(), &range),
    );
    let connected: Vec<PlatformRows> = [meta, google_ads].into_iter().flatten().collect();
    for rows in connected.iter().filter(|rows| rows.is_empty()) {
        info!("{:?} is connected but returned no campaigns", rows.platform());
    }

    let report = aggregate(connected, &state.config.channel_policy);
    let message = if report.is_demo() {
        info!("No ad platform connected, serving demo campaigns");
        "Demo campaigns: no ad platform connected"
    } else {
        info!(
            "Aggregated {} campaigns across {} channels",
            report.campaigns.len(),
            report.channels.len()
        );
        "Campaigns aggregated"
    };

    Json(ApiResponse {
        data: CampaignsResponse { range, report },
        message: message.to_string(),
    })
}

/// `None` when Meta is not connected; an empty row set when the fetch fails.
async fn meta_rows(
    state: &AppState,
    connection: Option<&MetaConnection>,
    range: &DateRange,
) -> Option<PlatformRows> {
    let connection = connection?;
    let rows = state
        .meta
        .campaign_insights(connection, range)
        .await
        .unwrap_or_else(|e| {
            warn!("Failed to fetch Meta campaigns, treating as empty: {}", e);
            Vec::new()
        });
    Some(PlatformRows::Meta(rows))
}

async fn google_ads_rows(
    state: &AppState,
    connection: Option<&GoogleAdsConnection>,
    range: &DateRange,
) -> Option<PlatformRows> {
    let connection = connection?;
    let rows = state
        .google_ads
        .campaigns(
            &connection.access_token,
            &connection.customer_id,
            &ReportWindow::from(range),
        )
        .await
        .unwrap_or_else(|e| {
            warn!("Failed to fetch Google Ads campaigns, treating as empty: {}", e);
            Vec::new()
        });
    Some(PlatformRows::GoogleAds(rows))
}
