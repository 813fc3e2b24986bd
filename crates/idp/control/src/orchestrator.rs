//! Deployment Orchestrator
//!
//! Triggering a deployment has a synchronous phase and a background phase.
//!
//! The synchronous phase loads the service and environment, short-circuits
//! on the idempotence key, checks the production guardrail, persists the
//! `pending` deployment with its `created` audit entry, registers the job
//! and schedules execution. The store's unique constraint on the
//! idempotence key closes the race between two identical concurrent
//! triggers: the loser re-reads and returns the winner's handle.
//!
//! The background phase is a self-contained [`DeploymentRun`] that opens its
//! own transactions. It commits `running` before executing and commits the
//! terminal status afterwards, so no deployment skips `running`. Failures are
//! only visible through the job registry and deployment history.

use crate::access::{authorize, Operation};
use crate::context::PlatformContext;
use crate::error::{PlatformError, Result};
use crate::executor::{DeploymentExecutor, SimulatedExecutor, TaskScheduler, TokioScheduler};
use crate::metrics::PlatformMetrics;
use crate::requests::TriggerDeployment;
use idp_audit::{metadata, AuditRecorder};
use idp_jobs::{JobRegistry, JobState, JobStatus};
use idp_store::{Constraint, EntityStore, StoreError};
use idp_types::{
    Actor, AuditAction, Deployment, DeploymentId, DeploymentKey, DeploymentStatus, EntityKind,
    EnvironmentId, JobId, ServiceId,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Job type registered for deployments
pub const DEPLOYMENT_JOB_TYPE: &str = "deployment";

/// Result of a deployment trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentHandle {
    pub job_id: JobId,
    pub deployment_id: DeploymentId,
    /// False when an existing deployment matched the idempotence key
    pub created: bool,
}

impl DeploymentHandle {
    fn existing(deployment: &Deployment) -> Self {
        Self {
            job_id: deployment.job_id(),
            deployment_id: deployment.id,
            created: false,
        }
    }
}

/// Drives deployments from trigger to terminal status
pub struct DeploymentOrchestrator {
    ctx: PlatformContext,
    executor: Arc<dyn DeploymentExecutor>,
    scheduler: Arc<dyn TaskScheduler>,
}

impl DeploymentOrchestrator {
    /// Orchestrator with the simulated executor and tokio scheduling
    pub fn new(ctx: PlatformContext) -> Self {
        Self::with_components(
            ctx,
            Arc::new(SimulatedExecutor::default()),
            Arc::new(TokioScheduler),
        )
    }

    pub fn with_components(
        ctx: PlatformContext,
        executor: Arc<dyn DeploymentExecutor>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        Self {
            ctx,
            executor,
            scheduler,
        }
    }

    /// Trigger a deployment of `request.version` into an environment
    ///
    /// Returns immediately after scheduling; poll [`Self::job_status`] or
    /// [`Self::deployment_history`] for the outcome.
    #[instrument(
        skip(self, request, approvals, actor),
        fields(
            service_id = %service_id,
            environment_id = %environment_id,
            version = %request.version,
            actor = %actor.identity,
        )
    )]
    pub async fn trigger_deployment(
        &self,
        service_id: &ServiceId,
        environment_id: &EnvironmentId,
        request: TriggerDeployment,
        approvals: &[String],
        actor: &Actor,
    ) -> Result<DeploymentHandle> {
        authorize(actor, Operation::TriggerDeployment)?;
        request.validate()?;

        // 1. Load service and environment
        let mut tx = self.ctx.begin().await?;
        let service = tx
            .get_service(service_id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Service, service_id))?;
        let environment = tx
            .get_environment(environment_id)
            .await?
            .filter(|env| env.service_id == service.id)
            .ok_or_else(|| PlatformError::not_found(EntityKind::Environment, environment_id))?;

        // 2. Idempotence
        let key = DeploymentKey {
            service_id: service.id,
            environment_id: environment.id,
            version: request.version.clone(),
        };
        if let Some(existing) = tx.find_deployment(&key).await? {
            info!(deployment_id = %existing.id, "Deployment already exists for key");
            return Ok(DeploymentHandle::existing(&existing));
        }

        // 3. Candidate
        let initiated_by = request
            .initiated_by
            .clone()
            .unwrap_or_else(|| actor.identity.clone());
        let deployment = Deployment::new(service.id, environment.id, key.version.clone(), initiated_by);

        // 4. Guardrail
        if let Err(violation) =
            self.ctx
                .guardrails
                .validate_production_deployment(&deployment, &environment, approvals)
        {
            drop(tx);
            warn!(reason = %violation.reason, "Deployment blocked");
            return Err(self
                .ctx
                .reject(
                    EntityKind::Environment,
                    environment.id,
                    actor,
                    violation,
                    metadata([("version", key.version.as_str())]),
                )
                .await);
        }

        // 5. Persist
        tx.put_deployment(deployment.clone());
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Deployment,
            deployment.id.to_string(),
            &actor.identity,
            metadata([("version", deployment.version.as_str())]),
        );
        match self.ctx.audit.commit(tx).await {
            Ok(_) => {}
            Err(StoreError::Conflict(Constraint::DeploymentKey(_))) => {
                let tx = self.ctx.begin().await?;
                let winner = tx.find_deployment(&key).await?.ok_or_else(|| {
                    PlatformError::Storage(format!("deployment {} vanished after conflict", key))
                })?;
                info!(deployment_id = %winner.id, "Concurrent trigger won the idempotence race");
                return Ok(DeploymentHandle::existing(&winner));
            }
            Err(err) => return Err(err.into()),
        }

        // 6. Job
        let job_id = deployment.job_id();
        self.ctx.jobs.create(job_id.clone(), DEPLOYMENT_JOB_TYPE)?;

        // 7. Background execution
        let run = DeploymentRun {
            store: self.ctx.store.clone(),
            audit: self.ctx.audit,
            jobs: self.ctx.jobs.clone(),
            executor: self.executor.clone(),
            metrics: self.ctx.metrics.clone(),
            deployment_id: deployment.id,
            job_id: job_id.clone(),
            performed_by: actor.identity.clone(),
        };
        self.scheduler.schedule(Box::pin(run.run()));

        info!(deployment_id = %deployment.id, job_id = %job_id, "Deployment scheduled");
        Ok(DeploymentHandle {
            job_id,
            deployment_id: deployment.id,
            created: true,
        })
    }

    /// Deployments of a service, oldest first
    pub async fn deployment_history(&self, service_id: &ServiceId) -> Result<Vec<Deployment>> {
        let tx = self.ctx.begin().await?;
        if tx.get_service(service_id).await?.is_none() {
            return Err(PlatformError::not_found(EntityKind::Service, service_id));
        }
        Ok(tx.list_deployments(service_id).await?)
    }

    pub async fn get_deployment(&self, id: &DeploymentId) -> Result<Deployment> {
        let tx = self.ctx.begin().await?;
        tx.get_deployment(id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Deployment, id))
    }

    pub fn job_status(&self, job_id: &JobId) -> Result<JobStatus> {
        Ok(self.ctx.jobs.get(job_id)?)
    }

    pub fn executor_name(&self) -> &str {
        self.executor.name()
    }
}

/// Background execution of one deployment
struct DeploymentRun {
    store: Arc<dyn EntityStore>,
    audit: AuditRecorder,
    jobs: Arc<JobRegistry>,
    executor: Arc<dyn DeploymentExecutor>,
    metrics: Option<Arc<PlatformMetrics>>,
    deployment_id: DeploymentId,
    job_id: JobId,
    performed_by: String,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl DeploymentRun {
    #[instrument(skip(self), fields(deployment_id = %self.deployment_id, job_id = %self.job_id))]
    async fn run(self) {
        let started = Instant::now();
        let deployment = match self.transition(DeploymentStatus::Running).await {
            Ok(deployment) => deployment,
            Err(err) => {
                error!(error = %err, "Failed to start deployment");
                self.finish(JobState::Failed, Some(err.to_string()), started);
                return;
            }
        };
        self.update_job(JobState::Running, None);

        let outcome = AssertUnwindSafe(self.executor.execute(&deployment))
            .catch_unwind()
            .await;
        let (status, detail) = match outcome {
            Ok(Ok(())) => (DeploymentStatus::Succeeded, None),
            Ok(Err(err)) => {
                warn!(error = %err, "Deployment execution failed");
                (DeploymentStatus::Failed, Some(err.to_string()))
            }
            Err(payload) => {
                let detail = format!("executor panicked: {}", panic_message(payload.as_ref()));
                error!(executor = self.executor.name(), "{}", detail);
                (DeploymentStatus::Failed, Some(detail))
            }
        };

        match self.transition(status).await {
            Ok(_) => {
                info!(status = %status.as_str(), "Deployment finished");
                self.finish(status.into(), detail, started);
            }
            Err(err) => {
                error!(error = %err, "Failed to record deployment outcome");
                self.finish(JobState::Failed, Some(err.to_string()), started);
            }
        }
    }

    fn finish(&self, state: JobState, detail: Option<String>, started: Instant) {
        self.update_job(state, detail);
        if let Some(metrics) = &self.metrics {
            metrics.observe_job(DEPLOYMENT_JOB_TYPE, started.elapsed());
        }
    }

    /// Commit a status transition with its audit entry
    async fn transition(&self, next: DeploymentStatus) -> Result<Deployment> {
        let mut tx = self.store.begin().await?;
        let mut deployment = tx
            .get_deployment(&self.deployment_id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Deployment, self.deployment_id))?;
        deployment.transition(next)?;

        tx.put_deployment(deployment.clone());
        self.audit.record(
            tx.as_mut(),
            AuditAction::Updated,
            EntityKind::Deployment,
            deployment.id.to_string(),
            &self.performed_by,
            metadata([("status", next.as_str())]),
        );
        self.audit.commit(tx).await?;
        Ok(deployment)
    }

    fn update_job(&self, state: JobState, detail: Option<String>) {
        if let Err(err) = self.jobs.update(&self.job_id, state, detail) {
            warn!(error = %err, "Failed to update job status");
        }
    }
}
