//! Request metrics middleware

use super::state::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Observe latency and failures per `METHOD /matched/path`
pub async fn track_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let endpoint = format!(
        "{} {}",
        request.method(),
        request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or("unmatched")
    );

    let started = Instant::now();
    let response = next.run(request).await;
    let status = response.status();

    state.metrics.observe_request(
        &endpoint,
        started.elapsed(),
        status.is_client_error() || status.is_server_error(),
    );
    response
}
