//! IDP Types - Core entity types for the internal developer platform
//!
//! The platform registers teams, services, environments and deployments,
//! gates changes through guardrails and records every mutation in an
//! append-only audit log.
//!
//! ## Ownership
//!
//! - A **Team** owns zero or more services (the reference is nullable).
//! - A **Service** exclusively owns its environments and deployments;
//!   deleting it removes both.
//! - An **Environment** belongs to exactly one service and carries a
//!   [`Tier`] (`dev < staging < prod`).
//! - A **Deployment** targets one environment of its own service and moves
//!   through `pending -> running -> succeeded | failed`.
//! - **AuditLog** entries are immutable once written.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod actor;
pub mod audit;
pub mod deployment;
pub mod environment;
pub mod ids;
pub mod policy;
pub mod service;
pub mod team;

use std::collections::BTreeMap;

/// Free-form configuration mapping attached to services, environments and policies
pub type ConfigMap = BTreeMap<String, serde_json::Value>;

/// Tag mapping attached to services (key order is irrelevant)
pub type TagMap = BTreeMap<String, String>;

// Re-export main types
pub use actor::{Actor, Role, RoleParseError};
pub use audit::{AuditAction, AuditLog, AuditQuery, EntityKind};
pub use deployment::{Deployment, DeploymentKey, DeploymentStatus, InvalidTransition};
pub use environment::{Environment, Tier, TierParseError};
pub use ids::{AuditLogId, DeploymentId, EnvironmentId, IdParseError, JobId, PolicyId, ServiceId, TeamId};
pub use policy::PlatformPolicy;
pub use service::Service;
pub use team::Team;
