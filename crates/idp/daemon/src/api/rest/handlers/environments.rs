//! Environment handlers

use super::parse_id;
use crate::api::rest::extract::{ApiJson, Caller};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use idp_control::{authorize, Operation, ProvisionEnvironment};
use idp_types::{Environment, ServiceId};

/// Provision an environment for a service
pub async fn provision_environment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ProvisionEnvironment>,
) -> ApiResult<(StatusCode, Json<Environment>)> {
    let service_id: ServiceId = parse_id(&id)?;
    let environment = state
        .platform
        .provision_environment(&service_id, request, &caller)
        .await?;
    Ok((StatusCode::CREATED, Json(environment)))
}

/// List the environments of a service
pub async fn list_environments(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Environment>>> {
    authorize(&caller, Operation::Read)?;
    let service_id: ServiceId = parse_id(&id)?;
    Ok(Json(state.platform.list_environments(&service_id).await?))
}
