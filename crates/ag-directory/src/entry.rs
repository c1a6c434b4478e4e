//! Directory entries returned by searches.

use std::collections::HashMap;

use ldap3::SearchEntry;

/// Represents a directory entry with parsed attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished Name.
    pub dn: String,

    /// Attributes (all values are multi-valued).
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(dn: impl Into<String>, attributes: HashMap<String, Vec<String>>) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }

    /// Gets a multi-valued attribute, matching the name case-insensitively.
    #[must_use]
    pub fn get_attrs(&self, name: &str) -> Option<&Vec<String>> {
        self.attributes.get(name).or_else(|| {
            self.attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, values)| values)
        })
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.get_attrs(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Checks if the entry has an attribute.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attrs(name).is_some()
    }

    /// Returns a copy restricted to the requested attributes.
    ///
    /// An empty list or `*` keeps every attribute.
    #[must_use]
    pub fn project(&self, attributes: &[&str]) -> Self {
        if attributes.is_empty() || attributes.contains(&"*") {
            return self.clone();
        }

        let attributes = self
            .attributes
            .iter()
            .filter(|(key, _)| attributes.iter().any(|a| a.eq_ignore_ascii_case(key)))
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect();

        Self {
            dn: self.dn.clone(),
            attributes,
        }
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs,
        }
    }
}
