//! Environment records and tiers

use crate::{ConfigMap, EnvironmentId, ServiceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment tier, totally ordered `dev < staging < prod`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Dev,
    Staging,
    Prod,
}

impl Tier {
    /// All tiers in promotion order
    pub const ORDERED: [Tier; 3] = [Tier::Dev, Tier::Staging, Tier::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Dev => "dev",
            Tier::Staging => "staging",
            Tier::Prod => "prod",
        }
    }

    /// Position in the promotion order (dev = 0)
    pub fn ordinal(&self) -> usize {
        match self {
            Tier::Dev => 0,
            Tier::Staging => 1,
            Tier::Prod => 2,
        }
    }

    /// Tiers that must exist before this one can be provisioned
    pub fn prerequisites(&self) -> &'static [Tier] {
        &Self::ORDERED[..self.ordinal()]
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Tier::Prod)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown tier name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown environment tier: {0}")]
pub struct TierParseError(pub String);

impl FromStr for Tier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Tier::Dev),
            "staging" => Ok(Tier::Staging),
            "prod" => Ok(Tier::Prod),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

/// An environment of a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,

    pub name: String,

    pub tier: Tier,

    /// Owning service (required)
    pub service_id: ServiceId,

    #[serde(default)]
    pub config: ConfigMap,

    pub created_at: DateTime<Utc>,
}

impl Environment {
    pub fn new(service_id: ServiceId, name: impl Into<String>, tier: Tier, config: ConfigMap) -> Self {
        Self {
            id: EnvironmentId::generate(),
            name: name.into(),
            tier,
            service_id,
            config,
            created_at: Utc::now(),
        }
    }
}
