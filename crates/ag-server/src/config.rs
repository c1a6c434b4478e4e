//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.
//! Only `JWT_SECRET` is required.

use std::time::Duration;

use ag_directory::{DirectoryConfig, ProviderKind};
use ag_token::{SigningAlgorithm, TokenConfig};
use anyhow::Context;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Application name reported by the root endpoint.
    pub app_name: String,

    /// Verbose logging and diagnostics.
    pub debug_mode: bool,

    /// Credential provider.
    pub provider: ProviderKind,

    /// Directory connection settings.
    pub directory: DirectoryConfig,

    /// Token signing settings.
    pub token: TokenConfig,

    /// How often expired revocations are dropped.
    pub prune_interval: Duration,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is missing or a variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value if set.
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is missing or a variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("AG_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(var("AG_PORT"), "AG_PORT", 8000)?;
        let app_name = var("APP_NAME").unwrap_or_else(|| "Auth Gateway".to_string());
        let debug_mode = parse_flag(var("DEBUG_MODE"), "DEBUG_MODE", false)?;

        let provider = match var("AUTH_PROVIDER") {
            Some(name) => name.parse::<ProviderKind>().context("invalid AUTH_PROVIDER")?,
            None => ProviderKind::default(),
        };

        let defaults = DirectoryConfig::default();
        let directory = DirectoryConfig::builder()
            .server_url(var("LDAP_SERVER").unwrap_or(defaults.server_url))
            .base_dn(var("LDAP_BASE_DN").unwrap_or(defaults.base_dn))
            .group_dn(var("LDAP_GROUP_DN").unwrap_or(defaults.group_dn))
            .auto_bind(parse_flag(var("LDAP_AUTO_BIND"), "LDAP_AUTO_BIND", defaults.auto_bind)?)
            .connect_timeout(Duration::from_secs(parse_or(
                var("LDAP_CONNECT_TIMEOUT_SECONDS"),
                "LDAP_CONNECT_TIMEOUT_SECONDS",
                defaults.connect_timeout.as_secs(),
            )?))
            .build()
            .context("invalid directory configuration")?;

        let token_defaults = TokenConfig::default();
        let token = TokenConfig {
            secret: var("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            algorithm: match var("JWT_ALGO") {
                Some(name) => name.parse::<SigningAlgorithm>().context("invalid JWT_ALGO")?,
                None => token_defaults.algorithm,
            },
            access_token_lifespan: parse_or(
                var("JWT_EXPIRATION_SECONDS"),
                "JWT_EXPIRATION_SECONDS",
                token_defaults.access_token_lifespan,
            )?,
            refresh_token_lifespan: parse_or(
                var("JWT_REFRESH_EXPIRATION_SECONDS"),
                "JWT_REFRESH_EXPIRATION_SECONDS",
                token_defaults.refresh_token_lifespan,
            )?,
        };
        token.validate().context("invalid token configuration")?;

        let prune_interval = Duration::from_secs(parse_or(
            var("REVOCATION_PRUNE_INTERVAL_SECONDS"),
            "REVOCATION_PRUNE_INTERVAL_SECONDS",
            300,
        )?);
        if prune_interval.is_zero() {
            anyhow::bail!("REVOCATION_PRUNE_INTERVAL_SECONDS must be positive");
        }

        Ok(Self {
            host,
            port,
            app_name,
            debug_mode,
            provider,
            directory,
            token,
            prune_interval,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            app_name: "Auth Gateway".to_string(),
            debug_mode: true,
            provider: ProviderKind::Ldap,
            directory: DirectoryConfig::default(),
            token: TokenConfig::new("test-signing-secret"),
            prune_interval: Duration::from_secs(60),
        }
    }

    /// Returns the socket address string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn parse_flag(value: Option<String>, key: &str, default: bool) -> anyhow::Result<bool> {
    match value.as_deref().map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => Ok(false),
        Some(v) => anyhow::bail!("{key} must be a boolean, got {v}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.directory.server_url, "ldap://localhost:10389");
        assert_eq!(config.directory.group_dn, "ou=groups,dc=example,dc=com");
        assert!(config.directory.auto_bind);
        assert_eq!(config.token.algorithm, SigningAlgorithm::Hs256);
        assert_eq!(config.token.access_token_lifespan, 1800);
        assert_eq!(config.token.refresh_token_lifespan, 86400);
        assert_eq!(config.prune_interval, Duration::from_secs(300));
        assert_eq!(config.provider, ProviderKind::Ldap);
    }

    #[test]
    fn secret_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
        assert!(load(&[("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("JWT_SECRET", "s3cret"),
            ("AG_PORT", "9090"),
            ("LDAP_SERVER", "ldaps://ldap.internal:636"),
            ("LDAP_AUTO_BIND", "False"),
            ("JWT_ALGO", "HS512"),
            ("JWT_EXPIRATION_SECONDS", "60"),
            ("DEBUG_MODE", "true"),
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
        assert!(config.directory.uses_tls());
        assert!(!config.directory.auto_bind);
        assert_eq!(config.token.algorithm, SigningAlgorithm::Hs512);
        assert_eq!(config.token.access_token_lifespan, 60);
        assert!(config.debug_mode);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("JWT_SECRET", "s"), ("AG_PORT", "http")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("AUTH_PROVIDER", "kerberos")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("JWT_ALGO", "RS256")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("LDAP_SERVER", "http://x")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("LDAP_AUTO_BIND", "maybe")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("JWT_EXPIRATION_SECONDS", "0")]).is_err());
        assert!(load(&[("JWT_SECRET", "s"), ("REVOCATION_PRUNE_INTERVAL_SECONDS", "0")]).is_err());
    }
}
