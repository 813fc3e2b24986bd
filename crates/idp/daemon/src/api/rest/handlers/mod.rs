//! API request handlers

mod audit;
mod deployments;
mod environments;
mod health;
mod metrics;
mod policies;
mod services;
mod teams;

pub use audit::*;
pub use deployments::*;
pub use environments::*;
pub use health::*;
pub use metrics::*;
pub use policies::*;
pub use services::*;
pub use teams::*;

use crate::error::{ApiError, ApiResult};
use idp_types::IdParseError;
use std::str::FromStr;

/// Parse a path identifier
fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = IdParseError>,
{
    raw.parse()
        .map_err(|e: IdParseError| ApiError::BadRequest(e.to_string()))
}
