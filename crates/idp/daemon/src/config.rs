//! Configuration for idpd

use idp_guardrails::GuardrailConfig;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Guardrail policy
    #[serde(default)]
    pub guardrails: GuardrailConfig,

    /// Deployment execution
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Deployment execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// How long the simulated executor takes per deployment
    #[serde(default = "default_simulated_duration_ms")]
    pub simulated_duration_ms: u64,

    /// Finished jobs kept for status queries before the oldest are evicted
    #[serde(default = "default_max_finished_jobs")]
    pub max_finished_jobs: usize,
}

impl ExecutionConfig {
    pub fn simulated_duration(&self) -> Duration {
        Duration::from_millis(self.simulated_duration_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            simulated_duration_ms: default_simulated_duration_ms(),
            max_finished_jobs: default_max_finished_jobs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

fn default_simulated_duration_ms() -> u64 {
    100
}

fn default_max_finished_jobs() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file and `IDP_*` variables
    ///
    /// Nested keys use a double underscore, e.g. `IDP_SERVER__LISTEN_ADDR`.
    /// Guardrail lists are comma separated.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with IDP_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("IDP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("guardrails.mandatory_tags")
                .with_list_parse_key("guardrails.allowed_data_sensitivity")
                .with_list_parse_key("guardrails.banned_config_keys")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert!(config.server.enable_cors);
        assert_eq!(config.guardrails, GuardrailConfig::default());
        assert_eq!(config.execution.simulated_duration(), Duration::from_millis(100));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: DaemonConfig = serde_json::from_str(
            r#"{"execution": {"simulated_duration_ms": 5}, "guardrails": {"mandatory_tags": ["owner"]}}"#,
        )
        .unwrap();
        assert_eq!(config.execution.simulated_duration_ms, 5);
        assert_eq!(config.execution.max_finished_jobs, 10_000);
        assert_eq!(config.guardrails.mandatory_tags, vec!["owner"]);
        assert_eq!(config.guardrails.banned_config_keys.len(), 3);
        assert_eq!(config.server.listen_addr, default_listen_addr());
    }

    #[test]
    fn test_load_without_file_matches_defaults() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.execution.simulated_duration_ms, 100);
        assert_eq!(config.guardrails, GuardrailConfig::default());
    }
}
