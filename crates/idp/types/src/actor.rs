//! Request actors and platform roles

use crate::TeamId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Platform role of an authenticated identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    PlatformAdmin,
    TeamAdmin,
    Developer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PlatformAdmin => "PLATFORM_ADMIN",
            Role::TeamAdmin => "TEAM_ADMIN",
            Role::Developer => "DEVELOPER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PLATFORM_ADMIN" => Ok(Role::PlatformAdmin),
            "TEAM_ADMIN" => Ok(Role::TeamAdmin),
            "DEVELOPER" => Ok(Role::Developer),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// Authenticated identity on whose behalf an operation runs
///
/// Passed explicitly into every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub identity: String,
    pub role: Role,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

impl Actor {
    pub fn new(identity: impl Into<String>, role: Role) -> Self {
        Self {
            identity: identity.into(),
            role,
            team_id: None,
        }
    }

    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
