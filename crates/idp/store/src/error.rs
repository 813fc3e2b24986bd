//! Store error types

use idp_types::{AuditLogId, DeploymentKey, EntityKind};
use std::fmt;
use thiserror::Error;

/// Unique constraint enforced at commit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    TeamName(String),
    ServiceName(String),
    PolicyName(String),
    DeploymentKey(DeploymentKey),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::TeamName(name) => write!(f, "team name '{}'", name),
            Constraint::ServiceName(name) => write!(f, "service name '{}'", name),
            Constraint::PolicyName(name) => write!(f, "policy name '{}'", name),
            Constraint::DeploymentKey(key) => write!(f, "deployment {}", key),
        }
    }
}

/// Store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Unique constraint violated: {0}")]
    Conflict(Constraint),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Audit entry {0} is immutable")]
    ImmutableAudit(AuditLogId),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
