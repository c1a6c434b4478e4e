//! Application state shared across all request handlers.

use std::sync::Arc;

use ag_directory::CredentialFacade;
use ag_token::TokenManager;

use crate::config::ServerConfig;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Credential checks and user lookups.
    pub credentials: CredentialFacade,

    /// Token issuance and verification.
    pub tokens: Arc<TokenManager>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        config: ServerConfig,
        credentials: CredentialFacade,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            credentials,
            tokens,
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
