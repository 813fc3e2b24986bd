//! Service catalog handlers

use super::parse_id;
use crate::api::rest::extract::{ApiJson, Caller};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use idp_control::{authorize, AssignTeam, Operation, RegisterService, UpdateService};
use idp_types::{Service, ServiceId};

/// Register a service
pub async fn register_service(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<RegisterService>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    let service = state.platform.register_service(request, &caller).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// List all services
pub async fn list_services(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Service>>> {
    authorize(&caller, Operation::Read)?;
    Ok(Json(state.platform.list_services().await?))
}

/// Get a specific service
pub async fn get_service(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Service>> {
    authorize(&caller, Operation::Read)?;
    let service_id: ServiceId = parse_id(&id)?;
    Ok(Json(state.platform.get_service(&service_id).await?))
}

/// Partially update a service
pub async fn update_service(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<UpdateService>,
) -> ApiResult<Json<Service>> {
    let service_id: ServiceId = parse_id(&id)?;
    let service = state
        .platform
        .update_service(&service_id, update, &caller)
        .await?;
    Ok(Json(service))
}

/// Assign a service to a team
pub async fn assign_team(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AssignTeam>,
) -> ApiResult<Json<Service>> {
    let service_id: ServiceId = parse_id(&id)?;
    let service = state
        .platform
        .assign_team(&service_id, &request.team_id, &caller)
        .await?;
    Ok(Json(service))
}

/// Delete a service with its environments and deployments
pub async fn delete_service(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let service_id: ServiceId = parse_id(&id)?;
    state.platform.delete_service(&service_id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
