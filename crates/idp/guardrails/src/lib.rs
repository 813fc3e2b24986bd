//! # IDP Guardrails
//!
//! Guardrails are organization-wide checks that can reject a platform
//! operation before any state changes. The [`GuardrailEngine`] is stateless
//! apart from its [`GuardrailConfig`] and every check is a pure function of
//! its inputs.
//!
//! ## Checks
//!
//! - **Mandatory tags**: every service carries the configured tag keys, and
//!   `data_sensitivity` (when present) holds an allowed value.
//! - **Environment promotion**: `staging` needs `dev`, `prod` needs `dev`
//!   and `staging`.
//! - **Production approval**: deployments into a `prod` environment need at
//!   least one approval.
//! - **Restricted configuration**: configuration keys must not name a
//!   credential (`password`, `secret`, `token`).
//!
//! Checks stop at the first violation; a [`GuardrailViolation`] names the
//! guardrail and carries a human-readable reason.
//!
//! ## Example
//!
//! ```rust
//! use idp_guardrails::{GuardrailConfig, GuardrailEngine};
//! use idp_types::{TagMap, Tier};
//!
//! let engine = GuardrailEngine::new(GuardrailConfig::default());
//!
//! let mut tags = TagMap::new();
//! tags.insert("owner".into(), "payments".into());
//! tags.insert("data_sensitivity".into(), "internal".into());
//! assert!(engine.validate_service_tags(&tags).is_ok());
//!
//! let err = engine
//!     .validate_environment_promotion(&["dev"], Tier::Prod)
//!     .unwrap_err();
//! assert_eq!(err.reason, "Environment staging must exist before provisioning prod");
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod engine;
pub mod error;

// Re-exports
pub use config::GuardrailConfig;
pub use engine::GuardrailEngine;
pub use error::{Guardrail, GuardrailViolation, Result};
