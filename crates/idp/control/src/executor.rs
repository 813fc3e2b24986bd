//! Pluggable deployment execution and background scheduling

use async_trait::async_trait;
use futures::future::BoxFuture;
use idp_types::Deployment;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure reported by a [`DeploymentExecutor`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ExecutionError(pub String);

impl ExecutionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Performs the actual rollout of a deployment
#[async_trait]
pub trait DeploymentExecutor: Send + Sync {
    /// Run the deployment to completion
    async fn execute(&self, deployment: &Deployment) -> Result<(), ExecutionError>;

    fn name(&self) -> &str;
}

/// Executor that only waits for a fixed duration
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    duration: Duration,
}

impl SimulatedExecutor {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl DeploymentExecutor for SimulatedExecutor {
    async fn execute(&self, deployment: &Deployment) -> Result<(), ExecutionError> {
        debug!(
            deployment_id = %deployment.id,
            version = %deployment.version,
            duration_ms = self.duration.as_millis() as u64,
            "Simulating deployment"
        );
        tokio::time::sleep(self.duration).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// Runs self-contained units of work outside the calling request
pub trait TaskScheduler: Send + Sync {
    /// Fire and forget
    fn schedule(&self, task: BoxFuture<'static, ()>);
}

/// Spawns tasks onto the current tokio runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TaskScheduler for TokioScheduler {
    fn schedule(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}
