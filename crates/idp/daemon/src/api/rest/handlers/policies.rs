//! Platform policy handlers

use crate::api::rest::extract::{ApiJson, Caller};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, http::StatusCode, Json};
use idp_control::{authorize, CreatePolicy, Operation};
use idp_types::PlatformPolicy;

/// Create a platform policy
pub async fn create_policy(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<CreatePolicy>,
) -> ApiResult<(StatusCode, Json<PlatformPolicy>)> {
    let policy = state.platform.create_policy(request, &caller).await?;
    Ok((StatusCode::CREATED, Json(policy)))
}

/// List platform policies
pub async fn list_policies(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<PlatformPolicy>>> {
    authorize(&caller, Operation::Read)?;
    Ok(Json(state.platform.list_policies().await?))
}
