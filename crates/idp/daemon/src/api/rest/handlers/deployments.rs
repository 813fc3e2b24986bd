//! Deployment and job handlers

use super::parse_id;
use crate::api::rest::extract::{ApiJson, Caller};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use idp_control::{approvals_for, authorize, DeploymentHandle, Operation, TriggerDeployment};
use idp_jobs::JobStatus;
use idp_types::{Deployment, DeploymentId, EnvironmentId, JobId, ServiceId};

/// Trigger a deployment; the response carries the job to poll
pub async fn trigger_deployment(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, env_id)): Path<(String, String)>,
    ApiJson(request): ApiJson<TriggerDeployment>,
) -> ApiResult<(StatusCode, Json<DeploymentHandle>)> {
    let service_id: ServiceId = parse_id(&id)?;
    let environment_id: EnvironmentId = parse_id(&env_id)?;
    let approvals = approvals_for(&caller);

    let handle = state
        .orchestrator
        .trigger_deployment(&service_id, &environment_id, request, &approvals, &caller)
        .await?;

    tracing::info!(
        job_id = %handle.job_id,
        created = handle.created,
        "Deployment accepted"
    );
    Ok((StatusCode::ACCEPTED, Json(handle)))
}

/// Deployment history of a service, oldest first
pub async fn deployment_history(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Deployment>>> {
    authorize(&caller, Operation::Read)?;
    let service_id: ServiceId = parse_id(&id)?;
    Ok(Json(state.orchestrator.deployment_history(&service_id).await?))
}

/// Get a specific deployment
pub async fn get_deployment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Deployment>> {
    authorize(&caller, Operation::Read)?;
    let deployment_id: DeploymentId = parse_id(&id)?;
    Ok(Json(state.orchestrator.get_deployment(&deployment_id).await?))
}

/// Status of an asynchronous job
pub async fn job_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<JobStatus>> {
    authorize(&caller, Operation::Read)?;
    Ok(Json(state.orchestrator.job_status(&JobId::new(id))?))
}
