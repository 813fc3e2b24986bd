//! Audit log handler

use crate::api::rest::extract::{ApiQuery, Caller};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use idp_types::{AuditLog, AuditQuery};

/// Audit entries, newest first
///
/// Filters: `entity_type`, `entity_id`, `action`, `limit`.
pub async fn audit_log(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> ApiResult<Json<Vec<AuditLog>>> {
    Ok(Json(state.platform.audit_log(&query, &caller).await?))
}
