//! # ag-directory
//!
//! Directory-backed authentication and user lookup for the auth gateway.
//!
//! The crate is layered leaf-first:
//!
//! - [`DirectoryGateway`] - opens, searches and releases directory connections.
//!   [`LdapGateway`] talks to a real server through `ldap3`; [`MemoryDirectory`]
//!   serves an in-process tree for tests.
//! - [`AuthStrategy`] / [`DirectoryAuthStrategy`] - verifies credentials with a bind.
//! - [`UserDirectory`] / [`DirectoryUserDirectory`] - read-only user and group lookups.
//! - [`CredentialFacade`] - the single surface handed to callers.
//!
//! The provider backing the facade is chosen from configuration via [`ProviderKind`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod entry;
pub mod error;
pub mod facade;
pub mod filter;
pub mod memory;
pub mod model;
pub mod provider;
pub mod strategy;
pub mod users;
pub mod validation;

pub use config::{DirectoryConfig, DirectoryConfigBuilder};
pub use connection::{DirectoryGateway, LdapGateway, LdapHandle, Principal};
pub use entry::DirectoryEntry;
pub use error::{DirectoryError, DirectoryResult};
pub use facade::CredentialFacade;
pub use filter::Filter;
pub use memory::{MemoryDirectory, MemoryHandle};
pub use model::UserInfo;
pub use provider::ProviderKind;
pub use strategy::{AuthStrategy, DirectoryAuthStrategy};
pub use users::{DirectoryUserDirectory, UserDirectory};
