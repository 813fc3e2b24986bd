//! Request correlation
//!
//! `SetRequestIdLayer` assigns an `x-request-id` when the client sent none
//! and `PropagateRequestIdLayer` echoes it on the response. The middleware
//! here copies it into JSON error bodies and the request span.

use crate::error::ErrorResponse;
use axum::{
    body::Body,
    extract::Request,
    http::HeaderName,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::Span;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

fn request_id<B>(request: &axum::http::Request<B>) -> Option<&str> {
    request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Span for one HTTP request
pub fn make_span(request: &axum::http::Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = request_id(request).unwrap_or("-"),
    )
}

/// Stamp the request id into error bodies produced by [`ApiError`](crate::error::ApiError)
pub async fn attach_request_id(request: Request, next: Next) -> Response {
    let id = request_id(&request).map(str::to_owned);
    let response = next.run(request).await;

    match (id, response.extensions().get::<ErrorResponse>()) {
        (Some(id), Some(body)) => {
            let mut body = body.clone();
            body.request_id = Some(id);
            let (mut parts, _) = response.into_parts();
            parts.extensions.remove::<ErrorResponse>();
            let rendered = Json(body).into_response();
            Response::from_parts(parts, rendered.into_body())
        }
        _ => response,
    }
}
