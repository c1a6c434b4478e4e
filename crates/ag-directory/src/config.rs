//! Directory provider configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, DirectoryResult};

/// Default server URL.
pub const DEFAULT_SERVER_URL: &str = "ldap://localhost:10389";

/// Default base DN for user entries.
pub const DEFAULT_BASE_DN: &str = "dc=example,dc=com";

/// Default base DN for group entries.
pub const DEFAULT_GROUP_DN: &str = "ou=groups,dc=example,dc=com";

/// Directory provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory server URL (`ldap://` or `ldaps://`).
    pub server_url: String,

    /// Base DN under which user entries live.
    pub base_dn: String,

    /// Base DN under which group entries live.
    pub group_dn: String,

    /// Whether anonymous connections bind immediately on open.
    pub auto_bind: bool,

    /// Connection establishment timeout.
    pub connect_timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            base_dn: DEFAULT_BASE_DN.to_string(),
            group_dn: DEFAULT_GROUP_DN.to_string(),
            auto_bind: true,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl DirectoryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> DirectoryConfigBuilder {
        DirectoryConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Configuration` if the URL scheme is not
    /// `ldap://`/`ldaps://`, the URL has no host, or a base DN is empty.
    pub fn validate(&self) -> DirectoryResult<()> {
        let url = self.server_url.to_lowercase();
        let host = url
            .strip_prefix("ldaps://")
            .or_else(|| url.strip_prefix("ldap://"))
            .ok_or_else(|| {
                DirectoryError::config(format!(
                    "server_url must start with ldap:// or ldaps://: {}",
                    self.server_url
                ))
            })?;

        if host.is_empty() {
            return Err(DirectoryError::config("server_url is missing a host"));
        }

        if self.base_dn.trim().is_empty() {
            return Err(DirectoryError::config("base_dn cannot be empty"));
        }

        if self.group_dn.trim().is_empty() {
            return Err(DirectoryError::config("group_dn cannot be empty"));
        }

        Ok(())
    }

    /// Returns true when the connection is TLS-protected from the start.
    #[must_use]
    pub fn uses_tls(&self) -> bool {
        self.server_url.to_lowercase().starts_with("ldaps://")
    }
}

/// Builder for [`DirectoryConfig`].
#[derive(Debug, Default)]
pub struct DirectoryConfigBuilder {
    config: DirectoryConfig,
}

impl DirectoryConfigBuilder {
    /// Creates a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server URL.
    #[must_use]
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    /// Sets the user base DN.
    #[must_use]
    pub fn base_dn(mut self, dn: impl Into<String>) -> Self {
        self.config.base_dn = dn.into();
        self
    }

    /// Sets the group base DN.
    #[must_use]
    pub fn group_dn(mut self, dn: impl Into<String>) -> Self {
        self.config.group_dn = dn.into();
        self
    }

    /// Sets whether anonymous connections bind on open.
    #[must_use]
    pub const fn auto_bind(mut self, auto_bind: bool) -> Self {
        self.config.auto_bind = auto_bind;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> DirectoryResult<DirectoryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
