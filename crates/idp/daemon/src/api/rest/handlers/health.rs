//! Health handler

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub executor: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        executor: state.orchestrator.executor_name().to_string(),
    })
}
