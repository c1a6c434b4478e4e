//! In-memory directory.
//!
//! Serves a small directory tree from process memory through the same
//! [`DirectoryGateway`] contract as the LDAP gateway. Intended for tests and
//! local development; it also tracks open handles so callers can assert that
//! every connection was released.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::connection::{DirectoryGateway, Principal};
use crate::entry::DirectoryEntry;
use crate::error::{DirectoryError, DirectoryResult};
use crate::filter::{Filter, GROUP_OBJECT_CLASS, MEMBER_ATTRIBUTE, OBJECT_CLASS_ATTRIBUTE};

#[derive(Debug, Default)]
struct State {
    entries: Vec<DirectoryEntry>,
    /// Bind passwords keyed by lowercased DN.
    passwords: HashMap<String, String>,
    deny_anonymous: bool,
    unreachable: bool,
    fail_searches: bool,
    open: usize,
    opened_total: usize,
}

/// In-memory directory tree.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: RwLock<State>,
}

/// Handle to an in-memory connection.
#[derive(Debug)]
pub struct MemoryHandle {
    bound_as: Option<String>,
    released: bool,
}

impl MemoryHandle {
    /// Returns the DN the connection is bound as, if any.
    #[must_use]
    pub fn bound_as(&self) -> Option<&str> {
        self.bound_as.as_deref()
    }

    /// Returns true once the connection has been released.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry with the given attributes.
    pub fn add_entry(&self, dn: &str, attributes: &[(&str, &str)]) {
        let mut attrs: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in attributes {
            attrs
                .entry((*name).to_string())
                .or_default()
                .push((*value).to_string());
        }
        self.state.write().entries.push(DirectoryEntry::new(dn, attrs));
    }

    /// Adds a person entry that can bind with `password`.
    pub fn add_user(&self, dn: &str, password: &str, attributes: &[(&str, &str)]) {
        let mut attrs = vec![(OBJECT_CLASS_ATTRIBUTE, "inetOrgPerson")];
        attrs.extend_from_slice(attributes);
        self.add_entry(dn, &attrs);
        self.set_password(dn, password);
    }

    /// Adds a `groupOfNames` entry listing `members` in order.
    pub fn add_group(&self, dn: &str, cn: &str, members: &[&str]) {
        let mut attrs = vec![(OBJECT_CLASS_ATTRIBUTE, GROUP_OBJECT_CLASS), ("cn", cn)];
        attrs.extend(members.iter().map(|m| (MEMBER_ATTRIBUTE, *m)));
        self.add_entry(dn, &attrs);
    }

    /// Sets the bind password for a DN, with or without an entry behind it.
    pub fn set_password(&self, dn: &str, password: &str) {
        self.state
            .write()
            .passwords
            .insert(dn.to_lowercase(), password.to_string());
    }

    /// Rejects anonymous binds.
    pub fn deny_anonymous(&self, deny: bool) {
        self.state.write().deny_anonymous = deny;
    }

    /// Makes every connection attempt fail as if the server were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.write().unreachable = unreachable;
    }

    /// Makes every search fail.
    pub fn fail_searches(&self, fail: bool) {
        self.state.write().fail_searches = fail;
    }

    /// Number of connections currently open.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.state.read().open
    }

    /// Number of connections opened since creation.
    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.state.read().opened_total
    }
}

fn is_under(dn: &str, base: &str) -> bool {
    let dn = dn.to_lowercase();
    let base = base.to_lowercase();
    dn == base || dn.ends_with(&format!(",{base}"))
}

#[async_trait]
impl DirectoryGateway for MemoryDirectory {
    type Handle = MemoryHandle;

    async fn connect(&self, principal: Option<&Principal>) -> DirectoryResult<MemoryHandle> {
        let mut state = self.state.write();

        if state.unreachable {
            return Err(DirectoryError::bind("connection refused"));
        }

        let bound_as = match principal {
            Some(p) => {
                let accepted = state
                    .passwords
                    .get(&p.dn.to_lowercase())
                    .is_some_and(|stored| stored == p.password());
                if !accepted {
                    return Err(DirectoryError::bind("invalid credentials"));
                }
                Some(p.dn.clone())
            }
            None if state.deny_anonymous => {
                return Err(DirectoryError::bind("anonymous bind not allowed"));
            }
            None => None,
        };

        state.open += 1;
        state.opened_total += 1;

        Ok(MemoryHandle {
            bound_as,
            released: false,
        })
    }

    async fn search(
        &self,
        handle: &mut MemoryHandle,
        base: &str,
        filter: &Filter,
        attributes: &[&str],
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        if handle.released {
            return Err(DirectoryError::operation("connection already released"));
        }

        let state = self.state.read();
        if state.fail_searches {
            return Err(DirectoryError::operation("search failed"));
        }

        Ok(state
            .entries
            .iter()
            .filter(|entry| is_under(&entry.dn, base) && filter.matches(entry))
            .map(|entry| entry.project(attributes))
            .collect())
    }

    async fn disconnect(&self, handle: &mut MemoryHandle) {
        if handle.released {
            return;
        }
        handle.released = true;
        let mut state = self.state.write();
        state.open = state.open.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> MemoryDirectory {
        let dir = MemoryDirectory::new();
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
        dir
    }

    #[tokio::test]
    async fn bind_checks_password() {
        let dir = directory();
        let good = Principal::new("cn=alice,dc=example,dc=com", "correctpw");
        let bad = Principal::new("cn=alice,dc=example,dc=com", "wrongpw");

        let mut handle = dir.connect(Some(&good)).await.unwrap();
        assert_eq!(handle.bound_as(), Some("cn=alice,dc=example,dc=com"));
        dir.disconnect(&mut handle).await;

        assert!(matches!(
            dir.connect(Some(&bad)).await,
            Err(DirectoryError::Bind(_))
        ));
        assert_eq!(dir.open_connections(), 0);
    }

    #[tokio::test]
    async fn search_is_scoped_to_base() {
        let dir = directory();
        let mut handle = dir.connect(None).await.unwrap();

        let users = dir
            .search(&mut handle, "dc=example,dc=com", &Filter::equal("cn", "alice"), &["cn"])
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
        assert!(!users[0].has_attr("mail"));

        let groups = dir
            .search(
                &mut handle,
                "ou=groups,dc=example,dc=com",
                &Filter::any_object(),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].dn, "cn=devs,ou=groups,dc=example,dc=com");

        dir.disconnect(&mut handle).await;
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let dir = directory();
        let mut handle = dir.connect(None).await.unwrap();
        assert_eq!(dir.open_connections(), 1);

        dir.disconnect(&mut handle).await;
        dir.disconnect(&mut handle).await;
        assert!(handle.is_released());
        assert_eq!(dir.open_connections(), 0);
        assert_eq!(dir.connections_opened(), 1);
    }

    #[tokio::test]
    async fn failure_switches() {
        let dir = directory();

        dir.deny_anonymous(true);
        assert!(matches!(dir.connect(None).await, Err(DirectoryError::Bind(_))));
        dir.deny_anonymous(false);

        dir.fail_searches(true);
        let mut handle = dir.connect(None).await.unwrap();
        let result = dir
            .search(&mut handle, "dc=example,dc=com", &Filter::any_object(), &[])
            .await;
        assert!(matches!(result, Err(DirectoryError::Operation(_))));
        dir.disconnect(&mut handle).await;

        dir.set_unreachable(true);
        assert!(matches!(dir.connect(None).await, Err(DirectoryError::Bind(_))));
    }
}
