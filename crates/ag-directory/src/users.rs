//! Read-only user and group lookups.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DirectoryConfig;
use crate::connection::DirectoryGateway;
use crate::error::{DirectoryError, DirectoryResult};
use crate::filter::{Filter, MEMBER_ATTRIBUTE, user_dn};
use crate::model::{USER_ATTRIBUTES, UserInfo};

/// Read-only view of users and groups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by common name.
    async fn get_user_details(&self, username: &str) -> DirectoryResult<Option<UserInfo>>;

    /// Lists a group's members in directory order.
    ///
    /// Fails with `GroupNotFound` when the group has no entry.
    async fn get_all_users_in_group(&self, group_name: &str) -> DirectoryResult<Vec<UserInfo>>;

    /// Checks whether `username` is listed as a member of `group_name`.
    ///
    /// A group that does not exist yields `false`.
    async fn check_group_membership(
        &self,
        group_name: &str,
        username: &str,
    ) -> DirectoryResult<bool>;
}

/// User directory backed by anonymous directory searches.
pub struct DirectoryUserDirectory<G: DirectoryGateway> {
    gateway: Arc<G>,
    base_dn: String,
    group_dn: String,
}

impl<G: DirectoryGateway> DirectoryUserDirectory<G> {
    /// Creates a user directory over the given gateway.
    #[must_use]
    pub fn new(gateway: Arc<G>, config: &DirectoryConfig) -> Self {
        Self {
            gateway,
            base_dn: config.base_dn.clone(),
            group_dn: config.group_dn.clone(),
        }
    }

    async fn find_user(
        &self,
        handle: &mut G::Handle,
        username: &str,
    ) -> DirectoryResult<Option<UserInfo>> {
        let entries = self
            .gateway
            .search(
                handle,
                &self.base_dn,
                &Filter::equal("cn", username),
                &USER_ATTRIBUTES,
            )
            .await?;
        Ok(entries.first().map(UserInfo::from_entry))
    }

    async fn group_members(
        &self,
        handle: &mut G::Handle,
        group_name: &str,
    ) -> DirectoryResult<Vec<UserInfo>> {
        let groups = self
            .gateway
            .search(
                handle,
                &self.group_dn,
                &Filter::group_named(group_name),
                &[MEMBER_ATTRIBUTE],
            )
            .await?;

        let Some(group) = groups.first() else {
            return Err(DirectoryError::GroupNotFound(group_name.to_string()));
        };

        let member_dns: Vec<String> = group
            .get_attrs(MEMBER_ATTRIBUTE)
            .cloned()
            .unwrap_or_default();

        let mut users = Vec::with_capacity(member_dns.len());
        for member_dn in &member_dns {
            let entries = self
                .gateway
                .search(handle, member_dn, &Filter::any_object(), &USER_ATTRIBUTES)
                .await?;
            let Some(entry) = entries.first() else {
                tracing::debug!(member = %member_dn, group = group_name, "member entry missing");
                continue;
            };
            let user = UserInfo::from_entry(entry);
            if user.has_any_value() {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn has_member(
        &self,
        handle: &mut G::Handle,
        group_name: &str,
        username: &str,
    ) -> DirectoryResult<bool> {
        let filter = Filter::and([
            Filter::group_named(group_name),
            Filter::equal(MEMBER_ATTRIBUTE, user_dn(username, &self.base_dn)),
        ]);
        let entries = self
            .gateway
            .search(handle, &self.group_dn, &filter, &["cn"])
            .await?;
        Ok(!entries.is_empty())
    }
}

#[async_trait]
impl<G: DirectoryGateway> UserDirectory for DirectoryUserDirectory<G> {
    async fn get_user_details(&self, username: &str) -> DirectoryResult<Option<UserInfo>> {
        let mut handle = self.gateway.connect(None).await?;
        let result = self.find_user(&mut handle, username).await;
        self.gateway.disconnect(&mut handle).await;
        result
    }

    async fn get_all_users_in_group(&self, group_name: &str) -> DirectoryResult<Vec<UserInfo>> {
        let mut handle = self.gateway.connect(None).await?;
        let result = self.group_members(&mut handle, group_name).await;
        self.gateway.disconnect(&mut handle).await;
        result
    }

    async fn check_group_membership(
        &self,
        group_name: &str,
        username: &str,
    ) -> DirectoryResult<bool> {
        if group_name.is_empty() || username.is_empty() {
            return Err(DirectoryError::input("group name and username are required"));
        }

        let mut handle = self.gateway.connect(None).await?;
        let result = self.has_member(&mut handle, group_name, username).await;
        self.gateway.disconnect(&mut handle).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDirectory;

    const ALICE: &str = "cn=alice,dc=example,dc=com";
    const BOB: &str = "cn=bob,dc=example,dc=com";

    fn setup() -> (Arc<MemoryDirectory>, DirectoryUserDirectory<MemoryDirectory>) {
        let dir = Arc::new(MemoryDirectory::new());
        dir.add_user(
            ALICE,
            "correctpw",
            &[("cn", "alice"), ("mail", "alice@example.com"), ("uid", "a1001")],
        );
        dir.add_user(BOB, "bobpass12", &[("cn", "bob"), ("sn", "Builder")]);
        dir.add_group(
            "cn=devs,ou=groups,dc=example,dc=com",
            "devs",
            &[BOB, "cn=departed,dc=example,dc=com", ALICE],
        );
        dir.add_group("cn=empty,ou=groups,dc=example,dc=com", "empty", &[]);
        let users = DirectoryUserDirectory::new(dir.clone(), &DirectoryConfig::default());
        (dir, users)
    }

    #[tokio::test]
    async fn user_details_found_and_missing() {
        let (dir, users) = setup();

        let alice = users.get_user_details("alice").await.unwrap().unwrap();
        assert_eq!(alice.mail.as_deref(), Some("alice@example.com"));
        assert!(users.get_user_details("nobody").await.unwrap().is_none());
        assert_eq!(dir.open_connections(), 0);
    }

    #[tokio::test]
    async fn group_members_keep_directory_order_and_skip_missing() {
        let (dir, users) = setup();

        let members = users.get_all_users_in_group("devs").await.unwrap();
        let names: Vec<_> = members.iter().filter_map(|u| u.cn.as_deref()).collect();
        assert_eq!(names, ["bob", "alice"]);
        assert_eq!(dir.open_connections(), 0);
    }

    #[tokio::test]
    async fn group_without_members_is_empty() {
        let (_dir, users) = setup();
        assert!(users.get_all_users_in_group("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_group_is_not_found_for_listing_but_false_for_membership() {
        let (dir, users) = setup();

        let listing = users.get_all_users_in_group("ops").await;
        assert!(matches!(listing, Err(DirectoryError::GroupNotFound(name)) if name == "ops"));

        assert!(!users.check_group_membership("ops", "alice").await.unwrap());
        assert_eq!(dir.open_connections(), 0);
    }

    #[tokio::test]
    async fn membership_checks_member_dn() {
        let (_dir, users) = setup();

        assert!(users.check_group_membership("devs", "alice").await.unwrap());
        assert!(users.check_group_membership("devs", "bob").await.unwrap());
        assert!(!users.check_group_membership("devs", "carol").await.unwrap());
        assert!(!users.check_group_membership("empty", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn membership_requires_both_inputs() {
        let (dir, users) = setup();

        assert!(matches!(
            users.check_group_membership("", "alice").await,
            Err(DirectoryError::InputValidation(_))
        ));
        assert!(matches!(
            users.check_group_membership("devs", "").await,
            Err(DirectoryError::InputValidation(_))
        ));
        assert_eq!(dir.connections_opened(), 0);
    }

    #[tokio::test]
    async fn infrastructure_failures_release_the_connection() {
        let (dir, users) = setup();

        dir.fail_searches(true);
        assert!(matches!(
            users.get_all_users_in_group("devs").await,
            Err(DirectoryError::Operation(_))
        ));
        assert!(matches!(
            users.get_user_details("alice").await,
            Err(DirectoryError::Operation(_))
        ));
        assert_eq!(dir.open_connections(), 0);

        dir.fail_searches(false);
        dir.set_unreachable(true);
        assert!(matches!(
            users.check_group_membership("devs", "alice").await,
            Err(DirectoryError::Bind(_))
        ));
    }
}
