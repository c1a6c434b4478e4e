//! # ag-server
//!
//! Axum server for the auth gateway.
//!
//! Exposes login, logout and token refresh, plus user and group queries for
//! callers holding a valid access token. Credentials are checked against the
//! configured directory; tokens are HMAC-signed JWTs tracked by a shared
//! revocation registry.
//!
//! ## Usage
//!
//! ```ignore
//! use ag_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config)?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod extract;
pub mod router;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use router::create_router;
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use ag_token::{RevocationRegistry, TokenManager};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// The auth gateway server.
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// Builds the credential provider and token manager and validates the
    /// configuration. No directory connection is opened until a request needs one.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider or token configuration is invalid.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let credentials = config.provider.build_facade(config.directory.clone())?;
        let registry = Arc::new(RevocationRegistry::new());
        let tokens = Arc::new(TokenManager::new(config.token.clone(), registry)?);

        tracing::info!(
            provider = %config.provider,
            algorithm = %config.token.algorithm,
            access_ttl = config.token.access_token_lifespan,
            refresh_ttl = config.token.refresh_token_lifespan,
            "auth gateway initialized"
        );

        let state = AppState::new(config.clone(), credentials, tokens);
        Ok(Self { config, state })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or serving fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let pruner =
            spawn_revocation_pruner(self.state.tokens.clone(), self.config.prune_interval);

        let app = create_router(self.state);
        let listener = TcpListener::bind(self.config.bind_address()).await?;

        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        // Run server with graceful shutdown
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        pruner.abort();
        served?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates a test router without starting the server.
    pub fn test_router(&self) -> Router {
        create_router(self.state.clone())
    }
}

/// Periodically drops revocations of tokens that have already expired.
pub fn spawn_revocation_pruner(tokens: Arc<TokenManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let pruned = tokens.prune_revocations();
            if pruned > 0 {
                tracing::info!(pruned, remaining = tokens.registry().len(), "revocations pruned");
            }
        }
    })
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
