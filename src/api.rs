//! HTTP API handlers for Wattscope.
//!
//! Every read endpoint recomputes from the in-memory sample store on each
//! request; nothing is cached between calls, so a live tick or re-ingestion
//! is visible immediately. Degenerate data (empty store, scopes with no
//! samples) produces empty payloads, not errors. Unknown scopes, entity
//! ids, and granularities are the caller's fault and return 400 or 404.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::aggregate::{
    BuildingTotal, RoomTotal, aggregate, building_totals, room_totals, scope_series,
    usage_summary,
};
use crate::detect::{DetectionReport, DetectorConfig, WasteOverview, detect_all, waste_status};
use crate::export::{alerts_to_csv, csv_filename};
use crate::feed::build_feed;
use crate::insights::{
    ActionSummary, Insight, LocationRecommendation, PotentialSavings, action_summary,
    location_recommendations, potential_savings, report_insights,
};
use crate::model::{
    AggregatedPoint, AlertFeedEntry, Granularity, RawSample, Scope, Severity, UsageSummary,
};
use crate::store::SampleStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<SampleStore>>,
    pub detector: DetectorConfig,
}

/// Build the API router over the given state.
pub fn router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/health", get(health_check))
        .route("/series", get(get_series))
        .route("/summary", get(get_summary))
        .route("/breakdown", get(get_breakdown))
        .route("/breakdown/:building", get(get_building_breakdown))
        .route("/alerts", get(get_alerts))
        .route("/alerts/export", get(export_alerts))
        .route("/detection", get(get_detection))
        .route("/insights", get(get_insights))
        .route("/samples", post(post_samples))
        .with_state(state)
}

/// Query parameters selecting a scope and optional entity.
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    /// `campus` (default), `building`, or `room`.
    pub scope: Option<String>,
    /// Building or room id; required for non-campus scopes.
    pub id: Option<String>,
}

/// Query parameters for the series endpoint.
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub scope: Option<String>,
    pub id: Option<String>,
    /// `hourly`, `daily` (default), `weekly`, `monthly`, or `yearly`.
    pub granularity: Option<String>,
}

/// Query parameters for the breakdown endpoints.
#[derive(Debug, Deserialize)]
pub struct BreakdownQuery {
    pub granularity: Option<String>,
}

/// Query parameters for the alerts endpoints.
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// Optional severity filter: `high`, `medium`, or `low`.
    pub severity: Option<String>,
}

/// Resolve scope query parameters against the campus structure.
///
/// Returns 400 for an unknown scope name or a missing id, 404 for an id
/// that names no building or room.
fn resolve_scope(
    store: &SampleStore,
    scope: Option<&str>,
    id: Option<&str>,
) -> Result<Scope, StatusCode> {
    match scope.unwrap_or("campus") {
        "campus" => Ok(Scope::Campus),
        "building" => {
            let id = id.ok_or_else(|| {
                warn!("Building scope requested without an id");
                StatusCode::BAD_REQUEST
            })?;
            if store.campus().building_by_id(id).is_none() {
                warn!(building = %id, "Unknown building");
                return Err(StatusCode::NOT_FOUND);
            }
            Ok(Scope::Building(id.to_string()))
        }
        "room" => {
            let id = id.ok_or_else(|| {
                warn!("Room scope requested without an id");
                StatusCode::BAD_REQUEST
            })?;
            if store.campus().room_by_id(id).is_none() {
                warn!(room = %id, "Unknown room");
                return Err(StatusCode::NOT_FOUND);
            }
            Ok(Scope::Room(id.to_string()))
        }
        other => {
            warn!(scope = %other, "Invalid scope");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

fn resolve_granularity(raw: Option<&str>) -> Result<Granularity, StatusCode> {
    match raw {
        None => Ok(Granularity::Daily),
        Some(raw) => raw.parse().map_err(|e| {
            warn!(error = %e, "Invalid granularity");
            StatusCode::BAD_REQUEST
        }),
    }
}

/// Display name for a resolved scope, for insight recommendations.
fn scope_location(store: &SampleStore, scope: &Scope) -> String {
    match scope {
        Scope::Campus => store.campus().name.clone(),
        Scope::Building(id) => store
            .campus()
            .building_by_id(id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| id.clone()),
        Scope::Room(id) => store
            .campus()
            .room_by_id(id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| id.clone()),
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Response for the series endpoint.
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub granularity: String,
    pub points: Vec<AggregatedPoint>,
}

/// GET /series - Aggregated consumption for a scope and granularity.
///
/// # Query Parameters
///
/// - `scope` (optional): `campus` (default), `building`, or `room`
/// - `id` (required for building/room): the entity id
/// - `granularity` (optional): `hourly`, `daily` (default), `weekly`,
///   `monthly`, or `yearly`
#[instrument(skip(state))]
pub async fn get_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse>, StatusCode> {
    let store = state.store.read().await;
    let scope = resolve_scope(&store, query.scope.as_deref(), query.id.as_deref())?;
    let granularity = resolve_granularity(query.granularity.as_deref())?;

    let points = aggregate(store.samples(), store.campus(), &scope, granularity, Utc::now());
    info!(
        scope = scope.kind().slug(),
        point_count = points.len(),
        "Series queried"
    );

    Ok(Json(SeriesResponse {
        scope: scope.kind().slug().to_string(),
        entity_id: query.id,
        granularity: query.granularity.unwrap_or_else(|| "daily".to_string()),
        points,
    }))
}

/// Response for the summary endpoint.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// `null` when the scope has no samples.
    pub summary: Option<UsageSummary>,
}

/// GET /summary - Usage statistics (total, average, peak hour) for a scope.
#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<SummaryResponse>, StatusCode> {
    let store = state.store.read().await;
    let scope = resolve_scope(&store, query.scope.as_deref(), query.id.as_deref())?;

    let series = scope_series(store.samples(), store.campus(), &scope);
    let summary = usage_summary(&series);
    info!(
        scope = scope.kind().slug(),
        has_data = summary.is_some(),
        "Summary queried"
    );

    Ok(Json(SummaryResponse {
        scope: scope.kind().slug().to_string(),
        entity_id: query.id,
        summary,
    }))
}

/// Response for the campus breakdown endpoint.
#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub granularity: String,
    pub buildings: Vec<BuildingTotal>,
}

/// GET /breakdown - Per-building totals, sorted descending.
///
/// Buildings with no samples in the window appear with zero consumption.
#[instrument(skip(state))]
pub async fn get_breakdown(
    State(state): State<AppState>,
    Query(query): Query<BreakdownQuery>,
) -> Result<Json<BreakdownResponse>, StatusCode> {
    let store = state.store.read().await;
    let granularity = resolve_granularity(query.granularity.as_deref())?;

    let buildings = building_totals(store.samples(), store.campus(), granularity, Utc::now());
    info!(building_count = buildings.len(), "Breakdown queried");

    Ok(Json(BreakdownResponse {
        granularity: query.granularity.unwrap_or_else(|| "daily".to_string()),
        buildings,
    }))
}

/// Response for the per-building breakdown endpoint.
#[derive(Debug, Serialize)]
pub struct BuildingBreakdownResponse {
    pub building_id: String,
    pub building_name: String,
    pub granularity: String,
    pub rooms: Vec<RoomTotal>,
}

/// GET /breakdown/:building - Per-room totals within one building.
#[instrument(skip(state))]
pub async fn get_building_breakdown(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
    Query(query): Query<BreakdownQuery>,
) -> Result<Json<BuildingBreakdownResponse>, StatusCode> {
    let store = state.store.read().await;
    let granularity = resolve_granularity(query.granularity.as_deref())?;

    let Some(building) = store.campus().building_by_id(&building_id) else {
        warn!(building = %building_id, "Unknown building");
        return Err(StatusCode::NOT_FOUND);
    };
    let building_name = building.name.clone();

    let rooms = room_totals(
        store.samples(),
        store.campus(),
        &building_id,
        granularity,
        Utc::now(),
    );
    info!(building = %building_id, room_count = rooms.len(), "Building breakdown queried");

    Ok(Json(BuildingBreakdownResponse {
        building_id,
        building_name,
        granularity: query.granularity.unwrap_or_else(|| "daily".to_string()),
        rooms,
    }))
}

/// Response for the alerts endpoint.
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertFeedEntry>,
    pub count: usize,
}

/// GET /alerts - The unified alert feed across all scopes.
///
/// # Query Parameters
///
/// - `severity` (optional): filter to `high`, `medium`, or `low`
#[instrument(skip(state))]
pub async fn get_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<AlertsResponse>, StatusCode> {
    let severity = match query.severity.as_deref() {
        None => None,
        Some("high") => Some(Severity::High),
        Some("medium") => Some(Severity::Medium),
        Some("low") => Some(Severity::Low),
        Some(other) => {
            warn!(severity = %other, "Invalid severity filter");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let store = state.store.read().await;
    let mut alerts = build_feed(&store, &state.detector);
    if let Some(severity) = severity {
        alerts.retain(|a| a.severity == severity);
    }

    info!(alert_count = alerts.len(), "Alerts queried");
    Ok(Json(AlertsResponse {
        count: alerts.len(),
        alerts,
    }))
}

/// GET /alerts/export - The alert feed as a CSV attachment.
#[instrument(skip(state))]
pub async fn export_alerts(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    let feed = build_feed(&store, &state.detector);
    let csv = alerts_to_csv(&feed);
    let filename = csv_filename(Utc::now());

    info!(alert_count = feed.len(), filename = %filename, "Alerts exported");

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
}

/// Response for the detection endpoint.
#[derive(Debug, Serialize)]
pub struct DetectionResponse {
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(flatten)]
    pub report: DetectionReport,
    pub waste: WasteOverview,
}

/// GET /detection - The full detection report for a scope: aggregate
/// anomalies, spike list, waste totals, and the overview status.
#[instrument(skip(state))]
pub async fn get_detection(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<DetectionResponse>, StatusCode> {
    let store = state.store.read().await;
    let scope = resolve_scope(&store, query.scope.as_deref(), query.id.as_deref())?;

    let series = scope_series(store.samples(), store.campus(), &scope);
    let report = detect_all(&series, &state.detector);
    let waste = waste_status(&report);

    info!(
        scope = scope.kind().slug(),
        anomaly_count = report.summary.anomaly_count,
        spike_count = report.summary.spike_count,
        "Detection queried"
    );

    Ok(Json(DetectionResponse {
        scope: scope.kind().slug().to_string(),
        entity_id: query.id,
        report,
        waste,
    }))
}

/// Response for the insights endpoint.
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub actions: ActionSummary,
    pub savings: PotentialSavings,
    pub insights: Vec<Insight>,
    pub recommendations: LocationRecommendation,
}

/// GET /insights - Derived guidance for a scope: focus areas from the
/// alert feed, projected savings, insight cards, and location tips.
#[instrument(skip(state))]
pub async fn get_insights(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<InsightsResponse>, StatusCode> {
    let store = state.store.read().await;
    let scope = resolve_scope(&store, query.scope.as_deref(), query.id.as_deref())?;
    let location = scope_location(&store, &scope);

    let feed = build_feed(&store, &state.detector);
    let series = scope_series(store.samples(), store.campus(), &scope);
    let report = detect_all(&series, &state.detector);

    info!(
        scope = scope.kind().slug(),
        insight_count = report.summary.anomaly_count,
        "Insights queried"
    );

    Ok(Json(InsightsResponse {
        actions: action_summary(&feed),
        savings: potential_savings(&report.summary, state.detector.rate_per_kwh),
        insights: report_insights(&report),
        recommendations: location_recommendations(&location),
    }))
}

/// Request body for the ingestion endpoint.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub samples: Vec<RawSample>,
}

/// Response for the ingestion endpoint.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Records kept after dropping malformed ones.
    pub accepted: usize,
    /// Records submitted.
    pub submitted: usize,
}

/// POST /samples - Replace the dataset with a caller-supplied one.
///
/// Malformed records (bad timestamps, negative consumption) are dropped
/// silently; the response reports how many survived.
#[instrument(skip(state, request), fields(submitted = request.samples.len()))]
pub async fn post_samples(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> impl IntoResponse {
    let submitted = request.samples.len();
    let mut store = state.store.write().await;
    let accepted = store.ingest(request.samples);

    info!(accepted, submitted, "Samples ingested");
    (
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            accepted,
            submitted,
        }),
    )
}
