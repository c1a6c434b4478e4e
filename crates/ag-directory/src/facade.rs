//! Single entry point for credential checks and user lookups.

use std::sync::Arc;

use crate::config::DirectoryConfig;
use crate::connection::DirectoryGateway;
use crate::error::{DirectoryError, DirectoryResult};
use crate::model::UserInfo;
use crate::strategy::{AuthStrategy, DirectoryAuthStrategy};
use crate::users::{DirectoryUserDirectory, UserDirectory};

/// Composes an authentication strategy with a user directory.
#[derive(Clone)]
pub struct CredentialFacade {
    strategy: Arc<dyn AuthStrategy>,
    users: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for CredentialFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialFacade").finish_non_exhaustive()
    }
}

impl CredentialFacade {
    /// Creates a facade from its parts.
    #[must_use]
    pub fn new(strategy: Arc<dyn AuthStrategy>, users: Arc<dyn UserDirectory>) -> Self {
        Self { strategy, users }
    }

    /// Creates a facade whose strategy and user directory share one gateway.
    #[must_use]
    pub fn for_gateway<G: DirectoryGateway>(gateway: Arc<G>, config: &DirectoryConfig) -> Self {
        Self::new(
            Arc::new(DirectoryAuthStrategy::new(gateway.clone(), config)),
            Arc::new(DirectoryUserDirectory::new(gateway, config)),
        )
    }

    /// Authenticates a user.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the strategy does not accept the
    /// credentials, or the strategy's own error.
    pub async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> DirectoryResult<UserInfo> {
        match self.strategy.authenticate(username, password).await? {
            Some(user) => {
                tracing::info!(username, "user authenticated");
                Ok(user)
            }
            None => {
                tracing::info!(username, "authentication rejected");
                Err(DirectoryError::InvalidCredentials)
            }
        }
    }

    /// Looks up a user by common name.
    ///
    /// # Errors
    ///
    /// Returns `Bind` or `Operation` when the directory cannot be queried.
    pub async fn get_user_details(&self, username: &str) -> DirectoryResult<Option<UserInfo>> {
        self.users.get_user_details(username).await
    }

    /// Lists the members of a group.
    pub async fn get_all_users_in_group(&self, group_name: &str) -> DirectoryResult<Vec<UserInfo>> {
        self.users.get_all_users_in_group(group_name).await
    }

    /// Checks group membership.
    pub async fn check_group_membership(
        &self,
        group_name: &str,
        username: &str,
    ) -> DirectoryResult<bool> {
        self.users.check_group_membership(group_name, username).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::memory::MemoryDirectory;

    struct RejectAll;

    #[async_trait]
    impl AuthStrategy for RejectAll {
        async fn authenticate(&self, _: &str, _: &str) -> DirectoryResult<Option<UserInfo>> {
            Ok(None)
        }
    }

    fn memory_facade() -> (Arc<MemoryDirectory>, CredentialFacade) {
        let dir = Arc::new(MemoryDirectory::new());
        dir.add_user(
            "cn=alice,dc=example,dc=com",
            "correctpw",
            &[("cn", "alice"), ("mail", "alice@example.com")],
        );
        dir.add_group(
            "cn=devs,ou=groups,dc=example,dc=com",
            "devs",
            &["cn=alice,dc=example,dc=com"],
        );
        let facade = CredentialFacade::for_gateway(dir.clone(), &DirectoryConfig::default());
        (dir, facade)
    }

    #[tokio::test]
    async fn delegates_to_strategy_and_directory() {
        let (dir, facade) = memory_facade();

        let user = facade.authenticate_user("alice", "correctpw").await.unwrap();
        assert_eq!(user.subject(), Some("alice"));

        assert!(facade.get_user_details("alice").await.unwrap().is_some());
        assert_eq!(facade.get_all_users_in_group("devs").await.unwrap(), vec![user]);
        assert!(facade.check_group_membership("devs", "alice").await.unwrap());
        assert_eq!(dir.open_connections(), 0);
    }

    #[tokio::test]
    async fn absent_result_becomes_invalid_credentials() {
        let (dir, _) = memory_facade();
        let users = Arc::new(DirectoryUserDirectory::new(dir, &DirectoryConfig::default()));
        let facade = CredentialFacade::new(Arc::new(RejectAll), users);

        let result = facade.authenticate_user("alice", "correctpw").await;
        assert!(matches!(result, Err(DirectoryError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn empty_password_is_rejected_without_binding() {
        let (dir, facade) = memory_facade();
        dir.set_password("cn=alice,dc=example,dc=com", "");

        let result = facade.authenticate_user("alice", "").await;
        assert!(matches!(result, Err(DirectoryError::InvalidCredentials)));
        assert_eq!(dir.connections_opened(), 0);
    }
}
