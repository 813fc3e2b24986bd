//! Guardrail configuration

use serde::{Deserialize, Serialize};

/// Tag key whose value is restricted to [`GuardrailConfig::allowed_data_sensitivity`]
pub const DATA_SENSITIVITY_TAG: &str = "data_sensitivity";

/// Configuration the guardrail engine is constructed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Tag keys every service must carry
    #[serde(default = "default_mandatory_tags")]
    pub mandatory_tags: Vec<String>,

    /// Permitted values of the `data_sensitivity` tag
    #[serde(default = "default_allowed_data_sensitivity")]
    pub allowed_data_sensitivity: Vec<String>,

    /// Configuration keys rejected case-insensitively
    #[serde(default = "default_banned_config_keys")]
    pub banned_config_keys: Vec<String>,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            mandatory_tags: default_mandatory_tags(),
            allowed_data_sensitivity: default_allowed_data_sensitivity(),
            banned_config_keys: default_banned_config_keys(),
        }
    }
}

fn default_mandatory_tags() -> Vec<String> {
    vec!["owner".into(), DATA_SENSITIVITY_TAG.into()]
}

fn default_allowed_data_sensitivity() -> Vec<String> {
    vec!["public".into(), "internal".into(), "confidential".into()]
}

fn default_banned_config_keys() -> Vec<String> {
    vec!["password".into(), "secret".into(), "token".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GuardrailConfig::default();
        assert_eq!(config.mandatory_tags, vec!["owner", "data_sensitivity"]);
        assert_eq!(config.allowed_data_sensitivity.len(), 3);
        assert!(config.banned_config_keys.contains(&"token".to_string()));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GuardrailConfig =
            serde_json::from_str(r#"{"mandatory_tags": ["owner", "cost_center"]}"#).unwrap();
        assert_eq!(config.mandatory_tags, vec!["owner", "cost_center"]);
        assert_eq!(
            config.allowed_data_sensitivity,
            GuardrailConfig::default().allowed_data_sensitivity
        );
    }
}
