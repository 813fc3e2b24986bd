//! Request payloads for platform operations

use crate::error::{PlatformError, Result};
use idp_types::{ConfigMap, EntityKind, TagMap, TeamId, Tier};
use serde::{Deserialize, Serialize};

fn require_name(kind: EntityKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PlatformError::InvalidRequest(format!(
            "{} name must not be empty",
            kind
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTeam {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateTeam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_name(EntityKind::Team, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterService {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: TagMap,
    #[serde(default)]
    pub config: ConfigMap,
}

impl RegisterService {
    pub fn new(name: impl Into<String>, tags: TagMap) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags,
            config: ConfigMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_name(EntityKind::Service, &self.name)
    }
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateService {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<TagMap>,
    #[serde(default)]
    pub config: Option<ConfigMap>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

impl UpdateService {
    /// Names of the fields this update touches
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.description.is_some() {
            fields.push("description");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        if self.config.is_some() {
            fields.push("config");
        }
        if self.team_id.is_some() {
            fields.push("team_id");
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignTeam {
    pub team_id: TeamId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionEnvironment {
    pub name: String,
    pub tier: Tier,
    #[serde(default)]
    pub config: ConfigMap,
}

impl ProvisionEnvironment {
    pub fn new(name: impl Into<String>, tier: Tier) -> Self {
        Self {
            name: name.into(),
            tier,
            config: ConfigMap::new(),
        }
    }

    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_name(EntityKind::Environment, &self.name)
    }
}

fn default_enforced() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePolicy {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default = "default_enforced")]
    pub enforced: bool,
}

impl CreatePolicy {
    pub fn new(name: impl Into<String>, config: ConfigMap) -> Self {
        Self {
            name: name.into(),
            description: None,
            config,
            enforced: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_name(EntityKind::Policy, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDeployment {
    pub version: String,
    /// Recorded on the deployment; defaults to the acting identity
    #[serde(default)]
    pub initiated_by: Option<String>,
}

impl TriggerDeployment {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            initiated_by: None,
        }
    }

    pub fn with_initiator(mut self, initiated_by: impl Into<String>) -> Self {
        self.initiated_by = Some(initiated_by.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(PlatformError::InvalidRequest(
                "deployment version must not be empty".into(),
            ));
        }
        Ok(())
    }
}
