//! API handlers for the snapshot and control endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::envelope::{ApiError, ApiResponse};
use crate::session::MonitorSession;
use crate::types::{CostField, CostProfile, Domain, EntityId};

/// Shared state of the API router.
#[derive(Clone)]
pub struct ApiState {
    pub session: MonitorSession,
}

impl ApiState {
    pub fn new(session: MonitorSession) -> Self {
        Self { session }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub domain: Domain,
    pub mode: &'static str,
    pub running: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub ids: Vec<EntityId>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub id: EntityId,
}

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct ClockResponse {
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct CostResponse {
    pub costs: CostProfile,
    pub is_optimizing: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/health
pub async fn health(State(state): State<ApiState>) -> Response {
    let snapshot = state.session.snapshot().await;
    ApiResponse::ok(HealthResponse {
        status: "ok",
        domain: snapshot.domain,
        mode: snapshot.mode,
        running: snapshot.running,
    })
}

/// GET /api/v1/snapshot
pub async fn snapshot(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.session.snapshot().await)
}

/// POST /api/v1/selection
pub async fn select(
    State(state): State<ApiState>,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = body(payload)?;
    state.session.select(request.ids).await;
    Ok(ApiResponse::ok(state.session.snapshot().await))
}

/// POST /api/v1/selection/toggle
pub async fn toggle_entity(
    State(state): State<ApiState>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = body(payload)?;
    state.session.toggle_entity(request.id).await;
    Ok(ApiResponse::ok(state.session.snapshot().await))
}

/// DELETE /api/v1/selection
pub async fn clear_selection(State(state): State<ApiState>) -> Response {
    state.session.clear_selection().await;
    ApiResponse::ok(state.session.snapshot().await)
}

/// POST /api/v1/clock/toggle
pub async fn toggle_clock(State(state): State<ApiState>) -> Response {
    let running = state.session.toggle_clock().await;
    ApiResponse::ok(ClockResponse { running })
}

/// POST /api/v1/reset
pub async fn reset(State(state): State<ApiState>) -> Response {
    state.session.reset().await;
    ApiResponse::ok(state.session.snapshot().await)
}

/// POST /api/v1/cost
pub async fn update_cost(
    State(state): State<ApiState>,
    payload: Result<Json<FieldUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = body(payload)?;
    let field: CostField = request.field.parse().map_err(ApiError::BadRequest)?;
    state.session.update_cost(field, request.value).await?;

    let snapshot = state.session.snapshot().await;
    Ok(ApiResponse::ok(CostResponse {
        costs: snapshot.costs,
        is_optimizing: snapshot.analysis.is_optimizing,
    }))
}

/// POST /api/v1/sensor
pub async fn update_sensor(
    State(state): State<ApiState>,
    payload: Result<Json<FieldUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = body(payload)?;
    state.session.update_sensor(&request.field, request.value).await?;
    Ok(ApiResponse::ok(state.session.snapshot().await))
}
