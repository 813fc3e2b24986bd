//! Error types for platform operations

use idp_guardrails::GuardrailViolation;
use idp_jobs::JobError;
use idp_store::{Constraint, StoreError};
use idp_types::{EntityKind, InvalidTransition, JobId};
use thiserror::Error;

/// Platform error type
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// Referenced entity is absent or belongs to a different owner
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Unique name or key collision
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: EntityKind, name: String },

    /// A guardrail rejected the operation
    #[error("Guardrail violation: {0}")]
    GuardrailViolation(#[from] GuardrailViolation),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// The actor's role does not permit the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Deployment state machine rejected a transition
    #[error("Invalid state: {0}")]
    InvalidState(#[from] InvalidTransition),

    /// Collaborator failure, e.g. a failed commit
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn already_exists(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            PlatformError::NotFound { .. } => "NOT_FOUND",
            PlatformError::AlreadyExists { .. } => "ALREADY_EXISTS",
            PlatformError::GuardrailViolation(_) => "GUARDRAIL_VIOLATION",
            PlatformError::JobNotFound(_) => "JOB_NOT_FOUND",
            PlatformError::PermissionDenied(_) => "PERMISSION_DENIED",
            PlatformError::InvalidRequest(_) => "INVALID_REQUEST",
            PlatformError::InvalidState(_) => "INVALID_STATE",
            PlatformError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<StoreError> for PlatformError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            StoreError::Conflict(constraint) => match constraint {
                Constraint::TeamName(name) => Self::already_exists(EntityKind::Team, name),
                Constraint::ServiceName(name) => Self::already_exists(EntityKind::Service, name),
                Constraint::PolicyName(name) => Self::already_exists(EntityKind::Policy, name),
                Constraint::DeploymentKey(key) => {
                    Self::already_exists(EntityKind::Deployment, key.to_string())
                }
            },
            StoreError::InvalidReference(msg) => Self::InvalidRequest(msg),
            err @ (StoreError::ImmutableAudit(_) | StoreError::Storage(_)) => {
                Self::Storage(err.to_string())
            }
        }
    }
}

impl From<JobError> for PlatformError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => Self::JobNotFound(id),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idp_guardrails::Guardrail;

    #[test]
    fn test_store_conflict_maps_to_already_exists() {
        let err: PlatformError =
            StoreError::Conflict(Constraint::ServiceName("payment-api".into())).into();
        assert_eq!(
            err,
            PlatformError::already_exists(EntityKind::Service, "payment-api")
        );
        assert_eq!(err.to_string(), "service already exists: payment-api");
    }

    #[test]
    fn test_store_failure_maps_to_storage() {
        let err: PlatformError = StoreError::Storage("disk full".into()).into();
        assert_eq!(err.code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_job_not_found() {
        let err: PlatformError = JobError::NotFound(JobId::new("deployment-x")).into();
        assert_eq!(err, PlatformError::JobNotFound(JobId::new("deployment-x")));
    }

    #[test]
    fn test_guardrail_reason_is_preserved() {
        let violation = GuardrailViolation::new(
            Guardrail::ProductionApproval,
            "Production deployments require approvals",
        );
        let err = PlatformError::from(violation);
        assert_eq!(
            err.to_string(),
            "Guardrail violation: Production deployments require approvals"
        );
        assert_eq!(err.code(), "GUARDRAIL_VIOLATION");
    }
}
