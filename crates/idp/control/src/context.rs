//! Shared collaborators for platform operations

use crate::error::{PlatformError, Result};
use idp_audit::{metadata, AuditRecorder};
use idp_guardrails::{GuardrailEngine, GuardrailViolation};
use idp_jobs::JobRegistry;
use idp_store::{EntityStore, StoreTransaction};
use crate::metrics::PlatformMetrics;
use idp_types::{Actor, AuditAction, ConfigMap, EntityKind};
use std::sync::Arc;

/// Collaborators shared by [`PlatformService`](crate::PlatformService) and
/// [`DeploymentOrchestrator`](crate::DeploymentOrchestrator)
///
/// Constructed once at startup and passed explicitly; cloning is cheap.
#[derive(Clone)]
pub struct PlatformContext {
    pub store: Arc<dyn EntityStore>,
    pub guardrails: Arc<GuardrailEngine>,
    pub audit: AuditRecorder,
    pub jobs: Arc<JobRegistry>,
    /// Job durations are observed here when set
    pub metrics: Option<Arc<PlatformMetrics>>,
}

impl PlatformContext {
    pub fn new(
        store: Arc<dyn EntityStore>,
        guardrails: Arc<GuardrailEngine>,
        jobs: Arc<JobRegistry>,
    ) -> Self {
        Self {
            store,
            guardrails,
            audit: AuditRecorder::new(),
            jobs,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PlatformMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(self.store.begin().await?)
    }

    /// Record a `guardrail_blocked` entry for `violation` and return it as an error
    ///
    /// The entry is committed in its own transaction; nothing else from the
    /// rejected operation is persisted.
    pub async fn reject(
        &self,
        entity_type: EntityKind,
        entity_id: impl ToString,
        actor: &Actor,
        violation: GuardrailViolation,
        mut details: ConfigMap,
    ) -> PlatformError {
        details.extend(metadata([
            ("guardrail", violation.guardrail.id()),
            ("reason", violation.reason.as_str()),
        ]));

        let mut tx = match self.begin().await {
            Ok(tx) => tx,
            Err(err) => return err,
        };
        self.audit.record(
            tx.as_mut(),
            AuditAction::GuardrailBlocked,
            entity_type,
            entity_id.to_string(),
            &actor.identity,
            details,
        );
        if let Err(err) = self.audit.commit(tx).await {
            return err.into();
        }

        violation.into()
    }
}

impl std::fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformContext")
            .field("guardrails", &self.guardrails)
            .field("jobs", &self.jobs.len())
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
