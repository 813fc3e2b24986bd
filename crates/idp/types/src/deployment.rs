//! Deployment records and the deployment status state machine
//!
//! ```text
//! pending --> running --> succeeded
//!                    \--> failed
//! ```
//!
//! `succeeded` and `failed` are terminal and no transition skips `running`.

use crate::{DeploymentId, EnvironmentId, JobId, ServiceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Deployment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// Persisted, waiting for background execution
    Pending,

    /// Background execution in progress
    Running,

    /// Execution finished successfully
    Succeeded,

    /// Execution raised an error
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Succeeded => "succeeded",
            DeploymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Succeeded | DeploymentStatus::Failed)
    }

    pub fn can_transition_to(&self, next: DeploymentStatus) -> bool {
        matches!(
            (self, next),
            (DeploymentStatus::Pending, DeploymentStatus::Running)
                | (DeploymentStatus::Running, DeploymentStatus::Succeeded)
                | (DeploymentStatus::Running, DeploymentStatus::Failed)
        )
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid deployment transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: DeploymentStatus,
    pub to: DeploymentStatus,
}

/// Idempotence key of a deployment: at most one deployment per triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentKey {
    pub service_id: ServiceId,
    pub environment_id: EnvironmentId,
    pub version: String,
}

impl fmt::Display for DeploymentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.service_id, self.environment_id, self.version)
    }
}

/// A deployment of a service version into one of its environments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,

    pub service_id: ServiceId,

    /// Target environment, owned by the same service
    pub environment_id: EnvironmentId,

    pub version: String,

    pub status: DeploymentStatus,

    /// Identity that requested the deployment
    pub initiated_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    /// Create a new deployment in `pending`
    pub fn new(
        service_id: ServiceId,
        environment_id: EnvironmentId,
        version: impl Into<String>,
        initiated_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DeploymentId::generate(),
            service_id,
            environment_id,
            version: version.into(),
            status: DeploymentStatus::Pending,
            initiated_by: initiated_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> DeploymentKey {
        DeploymentKey {
            service_id: self.service_id,
            environment_id: self.environment_id,
            version: self.version.clone(),
        }
    }

    /// Job handle under which background execution is tracked
    pub fn job_id(&self) -> JobId {
        JobId::for_deployment(&self.id)
    }

    /// Move to `next`, rejecting transitions the state machine forbids
    pub fn transition(&mut self, next: DeploymentStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment() -> Deployment {
        Deployment::new(ServiceId::generate(), EnvironmentId::generate(), "1.0.0", "alice")
    }

    #[test]
    fn test_new_deployment_is_pending() {
        let d = deployment();
        assert_eq!(d.status, DeploymentStatus::Pending);
        assert_eq!(d.created_at, d.updated_at);
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut d = deployment();
        d.transition(DeploymentStatus::Running).unwrap();
        d.transition(DeploymentStatus::Succeeded).unwrap();
        assert!(d.status.is_terminal());
    }

    #[test]
    fn test_cannot_skip_running() {
        let mut d = deployment();
        let err = d.transition(DeploymentStatus::Succeeded).unwrap_err();
        assert_eq!(err.from, DeploymentStatus::Pending);
        assert_eq!(d.status, DeploymentStatus::Pending);

        assert!(d.transition(DeploymentStatus::Failed).is_err());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut d = deployment();
        d.transition(DeploymentStatus::Running).unwrap();
        d.transition(DeploymentStatus::Failed).unwrap();
        assert!(d.transition(DeploymentStatus::Running).is_err());
        assert!(d.transition(DeploymentStatus::Succeeded).is_err());
    }

    #[test]
    fn test_key_identifies_triple() {
        let d = deployment();
        let key = d.key();
        assert_eq!(key.service_id, d.service_id);
        assert_eq!(key.environment_id, d.environment_id);
        assert_eq!(key.version, "1.0.0");
    }
}
