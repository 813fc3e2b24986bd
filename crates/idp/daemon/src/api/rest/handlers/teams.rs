//! Team handlers

use super::parse_id;
use crate::api::rest::extract::{ApiJson, Caller};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use idp_control::{authorize, CreateTeam, Operation};
use idp_types::{Team, TeamId};

/// Create a team
pub async fn create_team(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<CreateTeam>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let team = state.platform.create_team(request, &caller).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// List all teams
pub async fn list_teams(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Vec<Team>>> {
    authorize(&caller, Operation::Read)?;
    Ok(Json(state.platform.list_teams().await?))
}

/// Delete a team
pub async fn delete_team(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let team_id: TeamId = parse_id(&id)?;
    state.platform.delete_team(&team_id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
