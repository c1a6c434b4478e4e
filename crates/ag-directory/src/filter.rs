//! Typed directory search filters and DN construction.
//!
//! Filters are built as a tree and rendered to RFC 4515 text only at the
//! connection boundary, escaping every assertion value on the way out.

use std::fmt;

use crate::entry::DirectoryEntry;

/// Object class of group entries.
pub const GROUP_OBJECT_CLASS: &str = "groupOfNames";

/// Attribute listing a group's member DNs.
pub const MEMBER_ATTRIBUTE: &str = "member";

/// Attribute naming an entry's object classes.
pub const OBJECT_CLASS_ATTRIBUTE: &str = "objectClass";

/// A directory search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `(attr=value)`.
    Equal(String, String),
    /// `(attr=*)`.
    Present(String),
    /// `(&f1f2...)`.
    And(Vec<Filter>),
}

impl Filter {
    /// Equality assertion.
    #[must_use]
    pub fn equal(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equal(attr.into(), value.into())
    }

    /// Presence assertion.
    #[must_use]
    pub fn present(attr: impl Into<String>) -> Self {
        Self::Present(attr.into())
    }

    /// Conjunction of filters.
    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Matches every entry.
    #[must_use]
    pub fn any_object() -> Self {
        Self::present(OBJECT_CLASS_ATTRIBUTE)
    }

    /// Matches group entries with the given common name.
    #[must_use]
    pub fn group_named(group_name: &str) -> Self {
        Self::and([
            Self::equal(OBJECT_CLASS_ATTRIBUTE, GROUP_OBJECT_CLASS),
            Self::equal("cn", group_name),
        ])
    }

    /// Evaluates the filter against an entry.
    ///
    /// Attribute names and values compare case-insensitively, matching the
    /// default equality rules of the attributes this crate queries.
    #[must_use]
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Self::Equal(attr, value) => entry
                .get_attrs(attr)
                .is_some_and(|values| values.iter().any(|v| v.eq_ignore_ascii_case(value))),
            Self::Present(attr) => entry.has_attr(attr),
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal(attr, value) => write!(f, "({attr}={})", escape_filter_value(value)),
            Self::Present(attr) => write!(f, "({attr}=*)"),
            Self::And(filters) => write_composite(f, '&', filters),
        }
    }
}

fn write_composite(f: &mut fmt::Formatter<'_>, op: char, filters: &[Filter]) -> fmt::Result {
    write!(f, "({op}")?;
    for filter in filters {
        write!(f, "{filter}")?;
    }
    write!(f, ")")
}

/// Escapes special characters in filter assertion values (RFC 4515).
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\5c"),
            '*' => result.push_str("\\2a"),
            '(' => result.push_str("\\28"),
            ')' => result.push_str("\\29"),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}

/// Escapes special characters in an RDN attribute value (RFC 4514).
#[must_use]
pub fn escape_dn_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut result = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let needs_escape = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (i == 0 && (c == '#' || c == ' '))
            || (i == last && c == ' ');
        if needs_escape {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Builds the DN of a user entry: `cn={username},{base_dn}`.
#[must_use]
pub fn user_dn(username: &str, base_dn: &str) -> String {
    format!("cn={},{base_dn}", escape_dn_value(username))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn entry(attrs: &[(&str, &[&str])]) -> DirectoryEntry {
        let attributes: HashMap<String, Vec<String>> = attrs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.iter().map(ToString::to_string).collect()))
            .collect();
        DirectoryEntry::new("cn=devs,ou=groups,dc=example,dc=com", attributes)
    }

    #[test]
    fn renders_group_membership_filter() {
        let filter = Filter::and([
            Filter::equal("objectClass", GROUP_OBJECT_CLASS),
            Filter::equal("cn", "devs"),
            Filter::equal(MEMBER_ATTRIBUTE, user_dn("alice", "dc=example,dc=com")),
        ]);
        assert_eq!(
            filter.to_string(),
            "(&(objectClass=groupOfNames)(cn=devs)(member=cn=alice,dc=example,dc=com))"
        );
    }

    #[test]
    fn escapes_injected_values() {
        let filter = Filter::equal("cn", "*)(uid=*");
        assert_eq!(filter.to_string(), "(cn=\\2a\\29\\28uid=\\2a)");
    }

    #[test]
    fn filter_escape_special_chars() {
        assert_eq!(escape_filter_value("john*"), "john\\2a");
        assert_eq!(escape_filter_value("(admin)"), "\\28admin\\29");
        assert_eq!(escape_filter_value("user\\name"), "user\\5cname");
        assert_eq!(escape_filter_value("normal"), "normal");
    }

    #[test]
    fn dn_escape_special_chars() {
        assert_eq!(escape_dn_value("alice"), "alice");
        assert_eq!(escape_dn_value("doe, john"), "doe\\, john");
        assert_eq!(escape_dn_value("a=b+c"), "a\\=b\\+c");
        assert_eq!(escape_dn_value("#tag "), "\\#tag\\ ");
        assert_eq!(
            user_dn("evil,ou=admins", "dc=example,dc=com"),
            "cn=evil\\,ou\\=admins,dc=example,dc=com"
        );
    }

    #[test]
    fn evaluates_against_entries() {
        let group = entry(&[
            ("objectClass", &["top", "groupOfNames"]),
            ("cn", &["Devs"]),
            ("member", &["cn=alice,dc=example,dc=com", "cn=bob,dc=example,dc=com"]),
        ]);

        assert!(Filter::group_named("devs").matches(&group));
        assert!(Filter::any_object().matches(&group));
        assert!(Filter::equal("member", "CN=bob,dc=example,dc=com").matches(&group));
        assert!(!Filter::equal("member", "cn=carol,dc=example,dc=com").matches(&group));
        assert!(!Filter::present("mail").matches(&group));
    }
}
