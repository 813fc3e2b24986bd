//! Shared fixtures for platform integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::future::BoxFuture;
use idp_control::{
    DeploymentExecutor, DeploymentOrchestrator, ExecutionError, PlatformContext, PlatformMetrics,
    PlatformService, ProvisionEnvironment, RegisterService, TaskScheduler,
};
use idp_guardrails::GuardrailEngine;
use idp_jobs::{JobRegistry, JobState};
use idp_store::InMemoryStore;
use idp_types::{Actor, Deployment, Environment, JobId, Role, Service, TagMap, Tier};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

pub fn platform_admin() -> Actor {
    Actor::new("root", Role::PlatformAdmin)
}

pub fn team_admin() -> Actor {
    Actor::new("lead", Role::TeamAdmin)
}

pub fn developer() -> Actor {
    Actor::new("dev", Role::Developer)
}

// ---------------------------------------------------------------------------
// Scheduling and execution doubles
// ---------------------------------------------------------------------------

/// Holds scheduled tasks until the test runs them
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<Vec<BoxFuture<'static, ()>>>,
}

impl ManualScheduler {
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub async fn run_all(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
        for task in tasks {
            task.await;
        }
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule(&self, task: BoxFuture<'static, ()>) {
        self.tasks.lock().unwrap().push(task);
    }
}

/// Always fails with the given message
pub struct FailingExecutor(pub &'static str);

#[async_trait]
impl DeploymentExecutor for FailingExecutor {
    async fn execute(&self, _deployment: &Deployment) -> Result<(), ExecutionError> {
        Err(ExecutionError::new(self.0))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Blocks until released by the test
#[derive(Default)]
pub struct GatedExecutor {
    pub gate: Notify,
}

#[async_trait]
impl DeploymentExecutor for GatedExecutor {
    async fn execute(&self, _deployment: &Deployment) -> Result<(), ExecutionError> {
        self.gate.notified().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Panics instead of returning
pub struct PanickingExecutor;

#[async_trait]
impl DeploymentExecutor for PanickingExecutor {
    async fn execute(&self, _deployment: &Deployment) -> Result<(), ExecutionError> {
        panic!("registry unreachable")
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Succeeds immediately
pub struct InstantExecutor;

#[async_trait]
impl DeploymentExecutor for InstantExecutor {
    async fn execute(&self, _deployment: &Deployment) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "instant"
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub jobs: Arc<JobRegistry>,
    pub metrics: Arc<PlatformMetrics>,
    pub platform: PlatformService,
    pub orchestrator: Arc<DeploymentOrchestrator>,
}

impl Harness {
    pub fn new(
        executor: Arc<dyn DeploymentExecutor>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let jobs = Arc::new(JobRegistry::new());
        let metrics = Arc::new(PlatformMetrics::new().unwrap());
        let ctx = PlatformContext::new(
            store.clone(),
            Arc::new(GuardrailEngine::default()),
            jobs.clone(),
        )
        .with_metrics(metrics.clone());
        Self {
            store,
            jobs,
            metrics,
            platform: PlatformService::new(ctx.clone()),
            orchestrator: Arc::new(DeploymentOrchestrator::with_components(
                ctx, executor, scheduler,
            )),
        }
    }

    /// Harness whose background work only runs on `scheduler.run_all()`
    pub fn manual() -> (Self, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::default());
        let harness = Self::new(Arc::new(InstantExecutor), scheduler.clone());
        (harness, scheduler)
    }

    /// Register a valid service and provision the given tiers in order
    pub async fn service_with_tiers(&self, name: &str, tiers: &[Tier]) -> (Service, Vec<Environment>) {
        let admin = platform_admin();
        let service = self
            .platform
            .register_service(RegisterService::new(name, valid_tags()), &admin)
            .await
            .unwrap();

        let mut environments = Vec::new();
        for tier in tiers {
            let env = self
                .platform
                .provision_environment(
                    &service.id,
                    ProvisionEnvironment::new(tier.as_str(), *tier),
                    &admin,
                )
                .await
                .unwrap();
            environments.push(env);
        }
        (service, environments)
    }

    /// Poll the job registry until `job` reaches `state`
    pub async fn wait_for_job(&self, job: &JobId, state: JobState) {
        for _ in 0..200 {
            if self.jobs.get(job).map(|j| j.status) == Ok(state) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached {}", job, state);
    }
}

pub fn valid_tags() -> TagMap {
    tags(&[("owner", "payments"), ("data_sensitivity", "internal")])
}

pub fn tags(pairs: &[(&str, &str)]) -> TagMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
