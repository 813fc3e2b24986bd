//! Job registry error types

use crate::registry::JobState;
use idp_types::JobId;
use thiserror::Error;

/// Job registry errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job already exists: {0}")]
    AlreadyExists(JobId),

    #[error("Invalid job transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobState,
        to: JobState,
    },
}

/// Result type for job registry operations
pub type Result<T> = std::result::Result<T, JobError>;
