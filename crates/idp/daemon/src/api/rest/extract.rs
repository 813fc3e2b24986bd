//! Request extractors
//!
//! Caller identity is established by a fronting gateway and passed in
//! headers; the daemon only parses it.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use idp_types::{Actor, Role, TeamId};
use std::ops::Deref;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const TEAM_ID_HEADER: &str = "x-team-id";

/// JSON body whose rejection renders as an [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejection renders as an [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Authenticated caller of a request
#[derive(Debug, Clone)]
pub struct Caller(pub Actor);

impl Deref for Caller {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.0
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
            .map_err(|_| ApiError::Unauthorized(format!("{} is not valid text", name))),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = header(parts, ACTOR_ID_HEADER)?
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {}", ACTOR_ID_HEADER)))?;
        let role: Role = header(parts, ACTOR_ROLE_HEADER)?
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {}", ACTOR_ROLE_HEADER)))?
            .parse()
            .map_err(|e| ApiError::Unauthorized(format!("{}", e)))?;

        let mut actor = Actor::new(identity, role);
        if let Some(team) = header(parts, TEAM_ID_HEADER)? {
            let team_id: TeamId = team
                .parse()
                .map_err(|e| ApiError::Unauthorized(format!("{}", e)))?;
            actor = actor.with_team(team_id);
        }

        Ok(Caller(actor))
    }
}
