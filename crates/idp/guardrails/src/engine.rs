//! Guardrail engine
//!
//! Every check returns `Ok(())` or the first [`GuardrailViolation`] it finds.
//! Checks have no side effects; recording a rejection is the caller's job.

use crate::config::{GuardrailConfig, DATA_SENSITIVITY_TAG};
use crate::error::{Guardrail, GuardrailViolation, Result};
use idp_types::{ConfigMap, Deployment, Environment, Service, TagMap, Tier};
use std::collections::HashSet;
use tracing::debug;

/// Stateless policy checks over platform entities and requests
#[derive(Debug, Clone)]
pub struct GuardrailEngine {
    config: GuardrailConfig,
    /// Lowercased `config.banned_config_keys`
    banned_keys: HashSet<String>,
}

impl GuardrailEngine {
    pub fn new(config: GuardrailConfig) -> Self {
        let banned_keys = config
            .banned_config_keys
            .iter()
            .map(|k| k.to_lowercase())
            .collect();
        Self {
            config,
            banned_keys,
        }
    }

    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }

    /// Require every mandatory tag key and an allowed `data_sensitivity` value
    pub fn validate_service_tags(&self, tags: &TagMap) -> Result<()> {
        let missing: Vec<&str> = self
            .config
            .mandatory_tags
            .iter()
            .filter(|tag| !tags.contains_key(tag.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            debug!(missing = ?missing, "service tags rejected");
            return Err(GuardrailViolation::new(
                Guardrail::MandatoryTags,
                format!("Missing mandatory tags: {}", missing.join(", ")),
            ));
        }

        if let Some(sensitivity) = tags.get(DATA_SENSITIVITY_TAG) {
            if !self
                .config
                .allowed_data_sensitivity
                .iter()
                .any(|allowed| allowed == sensitivity)
            {
                return Err(GuardrailViolation::new(
                    Guardrail::DataSensitivity,
                    format!(
                        "Invalid data_sensitivity tag value: {} (allowed: {})",
                        sensitivity,
                        self.config.allowed_data_sensitivity.join(", ")
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Require every lower tier to exist before `target` is provisioned
    ///
    /// `existing_tiers` is matched case-insensitively; the first missing
    /// prerequisite in promotion order is reported.
    pub fn validate_environment_promotion<S: AsRef<str>>(
        &self,
        existing_tiers: &[S],
        target: Tier,
    ) -> Result<()> {
        let existing: HashSet<String> = existing_tiers
            .iter()
            .map(|t| t.as_ref().to_lowercase())
            .collect();

        match target
            .prerequisites()
            .iter()
            .find(|tier| !existing.contains(tier.as_str()))
        {
            Some(missing) => Err(GuardrailViolation::new(
                Guardrail::EnvironmentPromotion,
                format!(
                    "Environment {} must exist before provisioning {}",
                    missing, target
                ),
            )),
            None => Ok(()),
        }
    }

    /// Require at least one approval for deployments into `prod`
    pub fn validate_production_deployment(
        &self,
        deployment: &Deployment,
        environment: &Environment,
        approvals: &[String],
    ) -> Result<()> {
        if environment.tier.is_production() && approvals.is_empty() {
            debug!(
                version = %deployment.version,
                environment_id = %environment.id,
                "production deployment without approvals"
            );
            return Err(GuardrailViolation::new(
                Guardrail::ProductionApproval,
                "Production deployments require approvals",
            ));
        }
        Ok(())
    }

    /// Reject configuration keys naming a credential
    pub fn validate_config(&self, config: &ConfigMap) -> Result<()> {
        match config
            .keys()
            .find(|key| self.banned_keys.contains(&key.to_lowercase()))
        {
            Some(key) => Err(GuardrailViolation::new(
                Guardrail::RestrictedConfig,
                format!("Restricted configuration key: {}", key),
            )),
            None => Ok(()),
        }
    }

    /// Tag and configuration checks for a service
    pub fn enforce_service(&self, service: &Service) -> Result<()> {
        self.validate_service_tags(&service.tags)?;
        self.validate_config(&service.config)
    }
}

impl Default for GuardrailEngine {
    fn default() -> Self {
        Self::new(GuardrailConfig::default())
    }
}
