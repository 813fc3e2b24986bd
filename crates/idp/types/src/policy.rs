//! Organization-wide platform policies

use crate::{ConfigMap, PolicyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named organization-wide default policy
///
/// Policies are stored and listed but not consulted on the deployment path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformPolicy {
    pub id: PolicyId,

    /// Globally unique policy name
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    pub config: ConfigMap,

    pub enforced: bool,

    pub created_at: DateTime<Utc>,
}

impl PlatformPolicy {
    pub fn new(name: impl Into<String>, description: Option<String>, config: ConfigMap) -> Self {
        Self {
            id: PolicyId::generate(),
            name: name.into(),
            description,
            config,
            enforced: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_enforced(mut self, enforced: bool) -> Self {
        self.enforced = enforced;
        self
    }
}
