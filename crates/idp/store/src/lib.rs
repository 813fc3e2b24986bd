//! IDP Store - Entity persistence for the internal developer platform
//!
//! All reads and writes go through a [`StoreTransaction`] opened with
//! [`EntityStore::begin`]:
//!
//! - reads observe a consistent snapshot taken when the transaction began;
//! - writes are staged as [`Mutation`]s and applied atomically by
//!   [`StoreTransaction::commit`];
//! - unique constraints (team, service and policy names, and the deployment
//!   idempotence key) and cross-references are checked at commit time, so
//!   two transactions racing on the same key cannot both succeed.
//!
//! ## In-Memory vs Persistent
//!
//! [`InMemoryStore`] is suitable for development and testing. A persistent
//! backend implements the same traits.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod memory;
pub mod traits;

// Re-exports
pub use error::{Constraint, StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::{EntityStore, Mutation, StoreTransaction};
