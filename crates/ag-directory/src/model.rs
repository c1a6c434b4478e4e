//! Canonical user record produced by directory lookups.

use serde::{Deserialize, Serialize};

use crate::entry::DirectoryEntry;

/// Attributes fetched for every user lookup.
pub const USER_ATTRIBUTES: [&str; 4] = ["cn", "mail", "sn", "uid"];

/// User information read from the directory.
///
/// Every attribute is optional since directory entries may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Common name.
    pub cn: Option<String>,

    /// Email address.
    pub mail: Option<String>,

    /// Surname.
    pub sn: Option<String>,

    /// User ID.
    pub uid: Option<String>,
}

impl UserInfo {
    /// Builds user info from a directory entry.
    #[must_use]
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        let attr = |name: &str| entry.get_attr(name).map(ToString::to_string);
        Self {
            cn: attr("cn"),
            mail: attr("mail"),
            sn: attr("sn"),
            uid: attr("uid"),
        }
    }

    /// Returns true when at least one attribute holds a non-empty value.
    #[must_use]
    pub fn has_any_value(&self) -> bool {
        [&self.cn, &self.mail, &self.sn, &self.uid]
            .into_iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }

    /// Returns the principal name: the common name, falling back to the user ID.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.cn
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.uid.as_deref().filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn from_entry_maps_known_attributes() {
        let mut attrs = HashMap::new();
        attrs.insert("cn".to_string(), vec!["alice".to_string()]);
        attrs.insert("mail".to_string(), vec!["alice@example.com".to_string()]);
        let entry = DirectoryEntry::new("cn=alice,dc=example,dc=com", attrs);

        let info = UserInfo::from_entry(&entry);
        assert_eq!(info.cn.as_deref(), Some("alice"));
        assert_eq!(info.mail.as_deref(), Some("alice@example.com"));
        assert!(info.sn.is_none());
        assert!(info.uid.is_none());
        assert!(info.has_any_value());
    }

    #[test]
    fn empty_values_do_not_count() {
        let info = UserInfo {
            cn: Some(String::new()),
            ..UserInfo::default()
        };
        assert!(!info.has_any_value());
        assert!(info.subject().is_none());
    }

    #[test]
    fn subject_falls_back_to_uid() {
        let info = UserInfo {
            uid: Some("a123".to_string()),
            ..UserInfo::default()
        };
        assert_eq!(info.subject(), Some("a123"));
    }

    #[test]
    fn serializes_absent_attributes_as_null() {
        let json = serde_json::to_value(UserInfo::default()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(object.values().all(serde_json::Value::is_null));
    }
}
