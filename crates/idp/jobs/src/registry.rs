//! In-memory job registry

use crate::error::{JobError, Result};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use idp_types::{DeploymentStatus, JobId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// A job only moves forward; a pending job may fail before it starts
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match self {
            JobState::Pending => next != JobState::Pending,
            JobState::Running => next.is_terminal(),
            JobState::Succeeded | JobState::Failed => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DeploymentStatus> for JobState {
    fn from(status: DeploymentStatus) -> Self {
        match status {
            DeploymentStatus::Pending => JobState::Pending,
            DeploymentStatus::Running => JobState::Running,
            DeploymentStatus::Succeeded => JobState::Succeeded,
            DeploymentStatus::Failed => JobState::Failed,
        }
    }
}

/// Snapshot of a job's status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Failure detail or other human-readable context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Concurrent job status registry
///
/// At most `max_finished` terminal jobs are retained; once the cap is
/// exceeded the job that finished earliest is evicted and its status is only
/// available from the entity it tracked.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: DashMap<JobId, JobStatus>,
    finished: Mutex<VecDeque<JobId>>,
    max_finished: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(usize::MAX)
    }
}

impl JobRegistry {
    /// Registry that keeps every finished job
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that keeps at most `max_finished` terminal jobs
    pub fn with_retention(max_finished: usize) -> Self {
        Self {
            jobs: DashMap::new(),
            finished: Mutex::new(VecDeque::new()),
            max_finished,
        }
    }

    /// Register a new job in `pending`
    pub fn create(&self, id: JobId, job_type: impl Into<String>) -> Result<JobStatus> {
        match self.jobs.entry(id.clone()) {
            Entry::Occupied(_) => Err(JobError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let job = JobStatus {
                    id,
                    job_type: job_type.into(),
                    status: JobState::Pending,
                    created_at: now,
                    updated_at: now,
                    detail: None,
                };
                debug!(job_id = %job.id, job_type = %job.job_type, "Job registered");
                slot.insert(job.clone());
                Ok(job)
            }
        }
    }

    /// Transition an existing job
    pub fn update(
        &self,
        id: &JobId,
        status: JobState,
        detail: Option<String>,
    ) -> Result<JobStatus> {
        let job = {
            let mut job = self
                .jobs
                .get_mut(id)
                .ok_or_else(|| JobError::NotFound(id.clone()))?;

            if !job.status.can_transition_to(status) {
                return Err(JobError::InvalidTransition {
                    id: id.clone(),
                    from: job.status,
                    to: status,
                });
            }

            job.status = status;
            job.updated_at = Utc::now();
            if detail.is_some() {
                job.detail = detail;
            }
            job.clone()
        };
        debug!(job_id = %id, status = %status, "Job updated");

        if status.is_terminal() {
            self.retire(id.clone());
        }
        Ok(job)
    }

    /// Remember a finished job and evict the oldest beyond the cap
    fn retire(&self, id: JobId) {
        let evicted: Vec<JobId> = {
            let mut finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
            finished.push_back(id);
            let excess = finished.len().saturating_sub(self.max_finished);
            finished.drain(..excess).collect()
        };
        for id in evicted {
            self.jobs.remove(&id);
            debug!(job_id = %id, "Finished job evicted");
        }
    }

    pub fn get(&self, id: &JobId) -> Result<JobStatus> {
        self.jobs
            .get(id)
            .map(|job| job.clone())
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    /// All jobs, oldest first
    pub fn list(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<JobStatus> = self.jobs.iter().map(|j| j.value().clone()).collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
