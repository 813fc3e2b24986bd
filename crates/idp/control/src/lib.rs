//! IDP Control - Platform operations and deployment orchestration
//!
//! This crate is the core of the internal developer platform. It owns the
//! business rules that sit between a caller and the entity store:
//!
//! - [`PlatformService`]: team, service, environment, policy and audit
//!   operations, each guarded by the [`GuardrailEngine`](idp_guardrails::GuardrailEngine)
//!   and recorded in the audit trail;
//! - [`DeploymentOrchestrator`]: idempotent deployment triggering with
//!   asynchronous execution tracked in the [`JobRegistry`](idp_jobs::JobRegistry).
//!
//! Every mutating operation takes the acting [`Actor`](idp_types::Actor)
//! explicitly and checks it with [`authorize`] before touching state.
//!
//! ## Usage
//!
//! ```no_run
//! use idp_control::{DeploymentOrchestrator, PlatformContext, PlatformService};
//! use idp_guardrails::GuardrailEngine;
//! use idp_jobs::JobRegistry;
//! use idp_store::InMemoryStore;
//! use std::sync::Arc;
//!
//! let ctx = PlatformContext::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(GuardrailEngine::default()),
//!     Arc::new(JobRegistry::new()),
//! );
//! let platform = PlatformService::new(ctx.clone());
//! let orchestrator = DeploymentOrchestrator::new(ctx);
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod access;
pub mod context;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod orchestrator;
pub mod platform;
pub mod requests;

// Re-exports
pub use access::{approvals_for, authorize, Operation};
pub use context::PlatformContext;
pub use error::{PlatformError, Result};
pub use executor::{
    DeploymentExecutor, ExecutionError, SimulatedExecutor, TaskScheduler, TokioScheduler,
};
pub use metrics::PlatformMetrics;
pub use orchestrator::{DeploymentHandle, DeploymentOrchestrator, DEPLOYMENT_JOB_TYPE};
pub use platform::PlatformService;
pub use requests::{
    AssignTeam, CreatePolicy, CreateTeam, ProvisionEnvironment, RegisterService,
    TriggerDeployment, UpdateService,
};
