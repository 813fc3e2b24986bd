//! Application state for API handlers

use crate::config::DaemonConfig;
use crate::error::DaemonResult;
use idp_control::{
    DeploymentOrchestrator, PlatformContext, PlatformMetrics, PlatformService, SimulatedExecutor,
    TokioScheduler,
};
use idp_guardrails::GuardrailEngine;
use idp_jobs::JobRegistry;
use idp_store::InMemoryStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Catalog, environment, policy and audit operations
    pub platform: Arc<PlatformService>,

    /// Deployment triggering and status
    pub orchestrator: Arc<DeploymentOrchestrator>,

    /// Request and job metrics served on `/api/metrics`
    pub metrics: Arc<PlatformMetrics>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        platform: Arc<PlatformService>,
        orchestrator: Arc<DeploymentOrchestrator>,
        metrics: Arc<PlatformMetrics>,
    ) -> Self {
        Self {
            platform,
            orchestrator,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Wire the in-memory store, guardrails and job registry from configuration
    pub fn from_config(config: &DaemonConfig) -> DaemonResult<Self> {
        let metrics = Arc::new(PlatformMetrics::new()?);
        let ctx = PlatformContext::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(GuardrailEngine::new(config.guardrails.clone())),
            Arc::new(JobRegistry::with_retention(
                config.execution.max_finished_jobs,
            )),
        )
        .with_metrics(metrics.clone());
        let orchestrator = DeploymentOrchestrator::with_components(
            ctx.clone(),
            Arc::new(SimulatedExecutor::new(config.execution.simulated_duration())),
            Arc::new(TokioScheduler),
        );
        Ok(Self::new(
            Arc::new(PlatformService::new(ctx)),
            Arc::new(orchestrator),
            metrics,
        ))
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds().max(0);
        let (hours, rem) = (secs / 3600, secs % 3600);
        format!("{}h {}m {}s", hours, rem / 60, rem % 60)
    }
}
