//! # ag-token
//!
//! Bearer credential lifecycle for the auth gateway.
//!
//! ## Modules
//!
//! - [`claims`] - token payload and kind discriminator
//! - [`config`] - signing secret, algorithm and lifetimes
//! - [`error`] - token error kinds
//! - [`manager`] - issuance, verification and revocation
//! - [`revocation`] - process-wide registry of revoked token IDs
//!
//! A token is issued, stays valid until it expires or is revoked, and never
//! becomes valid again.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod config;
pub mod error;
pub mod manager;
pub mod revocation;

pub use claims::{TokenKind, TokenPayload, UserData};
pub use config::{SigningAlgorithm, TokenConfig};
pub use error::{TokenError, TokenResult};
pub use manager::{TokenManager, TokenResponse};
pub use revocation::RevocationRegistry;
