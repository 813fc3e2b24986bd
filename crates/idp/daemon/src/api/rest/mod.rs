//! REST API implementation

pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod request_id;
pub mod router;
pub mod state;
