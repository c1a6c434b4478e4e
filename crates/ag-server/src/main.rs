//! # Auth Gateway Server
//!
//! Main entry point for the auth gateway.

#![forbid(unsafe_code)]

use ag_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    let default_level = if config.debug_mode { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(app = %config.app_name, "Auth gateway starting...");

    Server::new(config)?.run().await
}
