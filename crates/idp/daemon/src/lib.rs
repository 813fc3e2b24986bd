//! IDP Daemon library
//!
//! REST surface of the internal developer platform:
//! - Team, service, environment and policy management
//! - Asynchronous deployments with job polling
//! - Audit log queries
//! - Server lifecycle management

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use api::create_router;
pub use api::rest::state::AppState;
pub use crate::config::DaemonConfig;
pub use error::{ApiError, DaemonError, ErrorResponse};
pub use server::Server;
