//! Health check endpoints
//!
//! Used by the hosting platform to probe the service.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::state::AppState;

/// Response for `GET /`
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub model: String,
    pub simulate: bool,
    pub uptime_seconds: u64,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// GET /
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

/// Main health check endpoint
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        model: state.bot.model_id().to_string(),
        simulate: state.settings.simulate(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Liveness probe endpoint
///
/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    // If we can respond, we're alive
    Json(LivenessResponse { alive: true })
}
