//! Credential provider selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::DirectoryConfig;
use crate::connection::LdapGateway;
use crate::error::{DirectoryError, DirectoryResult};
use crate::facade::CredentialFacade;

/// Backend that verifies credentials and answers user lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// LDAP directory server.
    #[default]
    Ldap,
}

impl ProviderKind {
    /// Returns the configuration name of the provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ldap => "ldap",
        }
    }

    /// Builds the facade for this provider.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Configuration` if the configuration is invalid.
    pub fn build_facade(self, config: DirectoryConfig) -> DirectoryResult<CredentialFacade> {
        config.validate()?;
        match self {
            Self::Ldap => {
                tracing::info!(
                    server = %config.server_url,
                    base_dn = %config.base_dn,
                    "using LDAP credential provider"
                );
                let gateway = Arc::new(LdapGateway::new(config));
                let config = gateway.config().clone();
                Ok(CredentialFacade::for_gateway(gateway, &config))
            }
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ldap" => Ok(Self::Ldap),
            other => Err(DirectoryError::config(format!(
                "unknown authentication provider: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!("ldap".parse::<ProviderKind>().unwrap(), ProviderKind::Ldap);
        assert_eq!(" LDAP ".parse::<ProviderKind>().unwrap(), ProviderKind::Ldap);
        assert!(matches!(
            "kerberos".parse::<ProviderKind>(),
            Err(DirectoryError::Configuration(_))
        ));
        assert_eq!(ProviderKind::default().to_string(), "ldap");
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ProviderKind::Ldap).unwrap();
        assert_eq!(json, "\"ldap\"");
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = DirectoryConfig {
            server_url: "http://localhost".to_string(),
            ..DirectoryConfig::default()
        };
        assert!(matches!(
            ProviderKind::Ldap.build_facade(config),
            Err(DirectoryError::Configuration(_))
        ));
        assert!(ProviderKind::Ldap.build_facade(DirectoryConfig::default()).is_ok());
    }
}
