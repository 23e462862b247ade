/*
 * Responsibility
 * - /actuator/health, /actuator/info (public)
 * - /actuator/metrics (ADMIN, access policy 側で強制)
 */
use axum::{Json, extract::State};

use crate::api::dto::actuator::{HealthResponse, InfoResponse, MetricsResponse};
use crate::state::AppState;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

pub async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        uptime_seconds: state.started_at.elapsed().as_secs(),
        auth: state.stats.snapshot(),
    })
}
