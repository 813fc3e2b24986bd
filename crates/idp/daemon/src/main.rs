//! IDP Daemon - internal developer platform service
//!
//! Serves the REST API for the service catalog, environment provisioning,
//! guardrail-checked deployments and the audit log.

use clap::Parser;
use idp_daemon::{DaemonConfig, DaemonError, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// IDP Daemon CLI
#[derive(Parser)]
#[command(name = "idpd")]
#[command(about = "IDP Daemon - internal developer platform", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "IDP_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configuration file
    #[arg(short, long, env = "IDP_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level, overrides the configuration file
    #[arg(long, env = "IDP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "IDP_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        "Starting idpd"
    );

    Server::new(config)?.run().await?;
    Ok(())
}
