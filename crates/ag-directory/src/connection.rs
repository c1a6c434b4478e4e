//! Directory connection gateway.
//!
//! The gateway is the only component that talks to the directory server.
//! Each call that needs the directory opens its own handle, uses it, and
//! hands it back to [`DirectoryGateway::disconnect`] on every exit path.
//! Handles are never shared between operations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchResult};

use crate::config::DirectoryConfig;
use crate::entry::DirectoryEntry;
use crate::error::{DirectoryError, DirectoryResult};
use crate::filter::Filter;

/// LDAP result code for a search base that does not exist.
const NO_SUCH_OBJECT: u32 = 32;

/// Credentials for a bound connection.
#[derive(Clone)]
pub struct Principal {
    /// Distinguished name to bind as.
    pub dn: String,
    password: String,
}

impl Principal {
    /// Creates a principal.
    #[must_use]
    pub fn new(dn: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            password: password.into(),
        }
    }

    /// Returns the bind password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("dn", &self.dn)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Opens, searches and releases directory connections.
///
/// ## Error contract
///
/// - Any failure while opening or binding is a single `DirectoryError::Bind`;
///   a wrong password and an unreachable server look the same here.
/// - Any search failure is `DirectoryError::Operation`.
/// - Nothing is retried.
#[async_trait]
pub trait DirectoryGateway: Send + Sync + 'static {
    /// Connection handle owned by a single operation.
    type Handle: Send;

    /// Opens a connection, binding as `principal` or anonymously when `None`.
    async fn connect(&self, principal: Option<&Principal>) -> DirectoryResult<Self::Handle>;

    /// Searches the subtree under `base`, returning entries in directory order.
    async fn search(
        &self,
        handle: &mut Self::Handle,
        base: &str,
        filter: &Filter,
        attributes: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>>;

    /// Releases a connection. Releasing an already-released handle is a no-op.
    async fn disconnect(&self, handle: &mut Self::Handle);
}

/// Gateway to an LDAP server using `ldap3`.
///
/// Each connection's protocol driver runs on its own spawned task, so the
/// calling request task only awaits results and never blocks on socket I/O.
#[derive(Debug, Clone)]
pub struct LdapGateway {
    config: Arc<DirectoryConfig>,
}

/// An open LDAP connection.
pub struct LdapHandle {
    ldap: Option<Ldap>,
}

impl LdapHandle {
    /// Returns true once the connection has been released.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.ldap.is_none()
    }
}

impl fmt::Debug for LdapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

impl LdapGateway {
    /// Creates a gateway for the configured server.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        if !config.uses_tls() {
            tracing::warn!(
                server = %config.server_url,
                "directory connection is not TLS-protected; credentials travel in cleartext"
            );
        }
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    async fn open(&self) -> DirectoryResult<Ldap> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.config.connect_timeout);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.config.server_url)
            .await
            .map_err(|e| DirectoryError::bind(format!("connection failed: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!(error = %e, "directory connection driver error");
            }
        });

        Ok(ldap)
    }
}

async fn simple_bind(ldap: &mut Ldap, dn: &str, password: &str) -> DirectoryResult<()> {
    ldap.simple_bind(dn, password)
        .await
        .map_err(|e| DirectoryError::bind(e.to_string()))?
        .success()
        .map_err(|e| DirectoryError::bind(format!("bind rejected: {e}")))?;
    Ok(())
}

#[async_trait]
impl DirectoryGateway for LdapGateway {
    type Handle = LdapHandle;

    async fn connect(&self, principal: Option<&Principal>) -> DirectoryResult<LdapHandle> {
        let mut ldap = self.open().await?;

        let bound = match principal {
            Some(p) => simple_bind(&mut ldap, &p.dn, p.password()).await,
            None if self.config.auto_bind => simple_bind(&mut ldap, "", "").await,
            None => Ok(()),
        };

        if let Err(err) = bound {
            tracing::warn!(
                principal = principal.map_or("<anonymous>", |p| p.dn.as_str()),
                error = %err,
                "directory bind failed"
            );
            let _ = ldap.unbind().await;
            return Err(err);
        }

        Ok(LdapHandle { ldap: Some(ldap) })
    }

    async fn search(
        &self,
        handle: &mut LdapHandle,
        base: &str,
        filter: &Filter,
        attributes: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        let ldap = handle
            .ldap
            .as_mut()
            .ok_or_else(|| DirectoryError::operation("connection already released"))?;

        let rendered = filter.to_string();
        let SearchResult(entries, result) = ldap
            .search(base, Scope::Subtree, &rendered, attributes.to_vec())
            .await
            .map_err(|e| {
                tracing::error!(base, filter = %rendered, error = %e, "directory search failed");
                DirectoryError::operation(e.to_string())
            })?;

        match result.rc {
            0 => Ok(entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(DirectoryEntry::from)
                .collect()),
            NO_SUCH_OBJECT => Ok(Vec::new()),
            rc => {
                tracing::error!(base, filter = %rendered, rc, text = %result.text, "directory search rejected");
                Err(DirectoryError::operation(format!(
                    "search returned rc={rc}: {}",
                    result.text
                )))
            }
        }
    }

    async fn disconnect(&self, handle: &mut LdapHandle) {
        if let Some(mut ldap) = handle.ldap.take() {
            if let Err(e) = ldap.unbind().await {
                tracing::debug!(error = %e, "directory unbind failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_debug_redacts_password() {
        let principal = Principal::new("cn=alice,dc=example,dc=com", "hunter22");
        let debug = format!("{principal:?}");
        assert!(debug.contains("cn=alice"));
        assert!(!debug.contains("hunter22"));
        assert_eq!(principal.password(), "hunter22");
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let gateway = LdapGateway::new(DirectoryConfig::default());
        let mut handle = LdapHandle { ldap: None };
        gateway.disconnect(&mut handle).await;
        gateway.disconnect(&mut handle).await;
        assert!(handle.is_released());
    }

    #[tokio::test]
    async fn search_on_released_handle_fails() {
        let gateway = LdapGateway::new(DirectoryConfig::default());
        let mut handle = LdapHandle { ldap: None };
        let result = gateway
            .search(&mut handle, "dc=example,dc=com", &Filter::any_object(), &["cn"])
            .await;
        assert!(matches!(result, Err(DirectoryError::Operation(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_bind_error() {
        let config = DirectoryConfig::builder()
            .server_url("ldap://127.0.0.1:1")
            .connect_timeout(std::time::Duration::from_millis(500))
            .build()
            .unwrap();
        let gateway = LdapGateway::new(config);

        let result = gateway.connect(None).await;
        assert!(matches!(result, Err(DirectoryError::Bind(_))));
    }
}
