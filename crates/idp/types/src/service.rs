//! Service records

use crate::{ConfigMap, ServiceId, TagMap, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered service
///
/// A service exclusively owns its environments and deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,

    /// Globally unique service name
    pub name: String,

    pub description: Option<String>,

    /// Owning team, if any
    pub team_id: Option<TeamId>,

    /// Organizational tags (`owner`, `data_sensitivity`, ...)
    #[serde(default)]
    pub tags: TagMap,

    /// Free-form service configuration
    #[serde(default)]
    pub config: ConfigMap,

    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(name: impl Into<String>, tags: TagMap) -> Self {
        Self {
            id: ServiceId::generate(),
            name: name.into(),
            description: None,
            team_id: None,
            tags,
            config: ConfigMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = config;
        self
    }

    pub fn with_team(mut self, team_id: Option<TeamId>) -> Self {
        self.team_id = team_id;
        self
    }
}
