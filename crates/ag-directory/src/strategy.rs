//! Authentication strategies.
//!
//! ## Security
//!
//! The directory server's bind is the credential check. Passwords are passed
//! straight to the bind and are never compared, logged or stored here.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DirectoryConfig;
use crate::connection::{DirectoryGateway, Principal};
use crate::error::{DirectoryError, DirectoryResult};
use crate::filter::{Filter, user_dn};
use crate::model::{USER_ATTRIBUTES, UserInfo};

/// Verifies a principal's credentials.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Authenticates a user and returns their information.
    ///
    /// `Ok(None)` means the credentials were not accepted.
    async fn authenticate(&self, username: &str, password: &str)
    -> DirectoryResult<Option<UserInfo>>;
}

/// Authenticates users by binding to the directory as them.
pub struct DirectoryAuthStrategy<G: DirectoryGateway> {
    gateway: Arc<G>,
    base_dn: String,
}

impl<G: DirectoryGateway> DirectoryAuthStrategy<G> {
    /// Creates a strategy over the given gateway.
    #[must_use]
    pub fn new(gateway: Arc<G>, config: &DirectoryConfig) -> Self {
        Self {
            gateway,
            base_dn: config.base_dn.clone(),
        }
    }

    async fn fetch_bound_user(
        &self,
        handle: &mut G::Handle,
        username: &str,
    ) -> DirectoryResult<UserInfo> {
        let entries = self
            .gateway
            .search(
                handle,
                &self.base_dn,
                &Filter::equal("cn", username),
                &USER_ATTRIBUTES,
            )
            .await?;

        match entries.first() {
            Some(entry) => Ok(UserInfo::from_entry(entry)),
            None => {
                tracing::warn!(username, "bind succeeded but no directory entry exists");
                Err(DirectoryError::InvalidCredentials)
            }
        }
    }
}

#[async_trait]
impl<G: DirectoryGateway> AuthStrategy for DirectoryAuthStrategy<G> {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> DirectoryResult<Option<UserInfo>> {
        // An empty password is an unauthenticated bind, which servers may accept.
        if username.is_empty() || password.is_empty() {
            tracing::warn!(username, "empty username or password rejected");
            return Err(DirectoryError::InvalidCredentials);
        }

        let principal = Principal::new(user_dn(username, &self.base_dn), password);

        let mut handle = match self.gateway.connect(Some(&principal)).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(username, error = %err, "directory rejected bind");
                return Err(DirectoryError::InvalidCredentials);
            }
        };

        let result = self.fetch_bound_user(&mut handle, username).await;
        self.gateway.disconnect(&mut handle).await;

        if let Err(err) = &result {
            if err.is_infrastructure_error() {
                tracing::error!(username, error = %err, "directory lookup failed after bind");
            }
        }

        result.map(Some)
    }
}
