//! Server Implementation
//!
//! HTTP server startup and shutdown

use std::net::SocketAddr;

use crate::api::build_router;
use crate::core::{Config, Result, ServerError, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        state.start_background_tasks();

        let addr: SocketAddr = format!("{}:{}", self.config.http_host, self.config.http_port)
            .parse()
            .map_err(|e| ServerError::Address(format!("{}: {}", self.config.http_host, e)))?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("🖨  Label server listening on {}", addr);

        let shutdown = state.shutdown.clone();
        let signal = async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
            shutdown.cancel();
        };

        axum::serve(listener, build_router(state.clone()))
            .with_graceful_shutdown(signal)
            .await?;

        // also stops background tasks when serve ends on its own
        state.shutdown.cancel();
        Ok(())
    }
}
