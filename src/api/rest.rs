// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and speak JSON. Mutations are turned
// into `DashboardEvent`s and applied through `AppState::dispatch`; rejected
// events map to 400 / 404 / 409 with an `{"error": ...}` body.
//
// CORS is permissive: the dashboard is served from a different origin during
// development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::app_state::{normalize_symbol, AppState, DashboardEvent, EventError};
use crate::portfolio::value_holding;
use crate::types::{AlertCondition, StreamStatus};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_body(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

impl From<EventError> for (StatusCode, Json<serde_json::Value>) {
    fn from(e: EventError) -> Self {
        let status = match e {
            EventError::Invalid(_) => StatusCode::BAD_REQUEST,
            EventError::NotFound(_) => StatusCode::NOT_FOUND,
            EventError::Conflict(_) => StatusCode::CONFLICT,
        };
        error_body(status, e.to_string())
    }
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/portfolio", get(portfolio).post(add_holding))
        .route("/api/v1/portfolio/:id", delete(remove_holding))
        .route("/api/v1/alerts", get(alerts).post(set_alert))
        .route("/api/v1/chart", get(chart))
        .route("/api/v1/stream/start", post(stream_start))
        .route("/api/v1/stream/stop", post(stream_stop))
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_state_view())
}

// =============================================================================
// Portfolio
// =============================================================================

async fn portfolio(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshot().portfolio())
}

#[derive(Deserialize)]
struct AddHoldingRequest {
    symbol: String,
    quantity: f64,
    purchase_price: f64,
}

async fn add_holding(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddHoldingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let event = DashboardEvent::add_holding(&req.symbol, req.quantity, req.purchase_price);
    let id = event.subject_id().map(str::to_owned);

    let snapshot = state.dispatch(event)?;
    let holding = snapshot
        .holdings
        .iter()
        .find(|h| id.as_deref() == Some(h.id.as_str()))
        .ok_or_else(|| error_body(StatusCode::INTERNAL_SERVER_ERROR, "holding vanished"))?;
    let valued = value_holding(holding, snapshot.latest_prices.get(&holding.symbol));

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Stock added successfully",
            "holding": valued,
        })),
    ))
}

async fn remove_holding(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.dispatch(DashboardEvent::HoldingRemoved { id })?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Stock removed successfully",
    })))
}

// =============================================================================
// Alerts
// =============================================================================

async fn alerts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshot().alerts_newest_first())
}

#[derive(Deserialize)]
struct SetAlertRequest {
    symbol: String,
    target_price: f64,
    condition: AlertCondition,
}

async fn set_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetAlertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let event = DashboardEvent::set_alert(&req.symbol, req.target_price, req.condition);
    let alert_id = event.subject_id().map(str::to_owned);

    state.dispatch(event)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Alert set successfully",
            "alert_id": alert_id,
        })),
    ))
}

// =============================================================================
// Chart
// =============================================================================

#[derive(Deserialize)]
struct ChartQuery {
    symbol: Option<String>,
}

async fn chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = query
        .symbol
        .map(|s| normalize_symbol(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.runtime_config.default_symbol.clone());

    let candles = state.history.fetch(&symbol).await.map_err(|e| {
        warn!(symbol = %symbol, error = %e, "history fetch failed");
        error_body(StatusCode::BAD_GATEWAY, format!("price history unavailable: {e}"))
    })?;

    let snapshot = state.dispatch(DashboardEvent::SymbolSelected { symbol, candles })?;
    let view = snapshot
        .chart
        .clone()
        .ok_or_else(|| error_body(StatusCode::INTERNAL_SERVER_ERROR, "chart not built"))?;
    Ok(Json(view))
}

// =============================================================================
// Streaming control
// =============================================================================

#[derive(Serialize)]
struct StreamResponse {
    streaming: StreamStatus,
    message: &'static str,
}

async fn stream_start(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.dispatch(DashboardEvent::StreamingStarted)?;
    Ok(Json(StreamResponse {
        streaming: StreamStatus::Streaming,
        message: "Price stream started",
    }))
}

async fn stream_stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.dispatch(DashboardEvent::StreamingStopped)?;
    Ok(Json(StreamResponse {
        streaming: StreamStatus::Idle,
        message: "Price stream stopped",
    }))
}
