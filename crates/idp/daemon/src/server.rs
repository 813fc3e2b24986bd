//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use tokio::net::TcpListener;

/// IDP Daemon Server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    /// Application state shared with the handlers
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(self.state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("IDP daemon listening on {}", addr);
        tracing::info!(
            mandatory_tags = ?self.config.guardrails.mandatory_tags,
            banned_config_keys = ?self.config.guardrails.banned_config_keys,
            "Guardrails loaded"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("IDP daemon shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
