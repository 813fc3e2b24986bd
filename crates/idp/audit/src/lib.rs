//! IDP Audit - Append-only audit trail
//!
//! Every state-changing operation, and every operation a guardrail rejects,
//! leaves exactly one [`AuditLog`](idp_types::AuditLog) entry. Entries are
//! staged into the same [`StoreTransaction`](idp_store::StoreTransaction) as
//! the change they describe, so the audit record and the change commit or
//! roll back together.
//!
//! Once a transaction commits through [`AuditRecorder::commit`], each of its
//! entries is also emitted as a structured tracing event on the `idp::audit`
//! target.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod recorder;

// Re-exports
pub use recorder::{metadata, AuditRecorder, AUDIT_TARGET};
