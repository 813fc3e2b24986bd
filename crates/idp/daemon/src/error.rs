//! Error types for idpd

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use idp_control::PlatformError;
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DaemonError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Failure inside the daemon itself
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error raised by a platform operation
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Platform(err) => match err {
                PlatformError::NotFound { .. } | PlatformError::JobNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                PlatformError::AlreadyExists { .. } | PlatformError::InvalidState(_) => {
                    StatusCode::CONFLICT
                }
                PlatformError::GuardrailViolation(_) | PlatformError::InvalidRequest(_) => {
                    StatusCode::BAD_REQUEST
                }
                PlatformError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                PlatformError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Platform(err) => err.code(),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Filled in by the request-id middleware
    pub request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let details = match &self {
            ApiError::Platform(PlatformError::GuardrailViolation(v)) => {
                Some(serde_json::json!({ "guardrail": v.guardrail.id() }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            details,
            request_id: None,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
