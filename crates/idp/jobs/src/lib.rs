//! IDP Jobs - Status tracking for long-running operations
//!
//! The [`JobRegistry`] is a process-lifetime cache of job status keyed by
//! [`JobId`](idp_types::JobId). It is shared between request handlers and
//! background tasks and is safe for concurrent use. It is not durable: after
//! a restart the entity store remains the source of truth for deployment
//! state.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod registry;

// Re-exports
pub use error::{JobError, Result};
pub use registry::{JobRegistry, JobState, JobStatus};
