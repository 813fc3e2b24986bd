//! Prometheus scrape endpoint

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, http::header};

/// Metrics in the Prometheus text format
pub async fn metrics_handler(
    State(state): State<AppState>,
) -> ApiResult<([(header::HeaderName, &'static str); 1], String)> {
    let body = state
        .metrics
        .export()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}
