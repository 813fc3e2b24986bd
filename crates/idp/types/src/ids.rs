//! Strongly-typed identifiers for IDP entities
//!
//! Entity IDs are UUID-based but wrapped in newtype structs for type safety.
//! Job IDs are derived strings (`deployment-<uuid>`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when an identifier cannot be parsed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind} id: {value}")]
pub struct IdParseError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|_| IdParseError {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a team
    TeamId,
    "team"
);
uuid_id!(
    /// Unique identifier for a service
    ServiceId,
    "service"
);
uuid_id!(
    /// Unique identifier for an environment
    EnvironmentId,
    "environment"
);
uuid_id!(
    /// Unique identifier for a deployment
    DeploymentId,
    "deployment"
);
uuid_id!(
    /// Unique identifier for a platform policy
    PolicyId,
    "policy"
);
uuid_id!(
    /// Unique identifier for an audit entry
    AuditLogId,
    "audit"
);

/// Identifier of an asynchronous job tracked by the job registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Job handle for a deployment, stable across repeated triggers
    pub fn for_deployment(id: &DeploymentId) -> Self {
        Self(format!("deployment-{}", id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
