//! Directory error types.
//!
//! ## Security Note
//!
//! Bind and search failures carry the underlying client message for logging.
//! Callers exposing errors to end users must not forward that text verbatim.

use thiserror::Error;

/// Errors raised by directory authentication and lookup.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory rejected the credentials, or the bound principal has no entry.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Opening or binding a directory connection failed.
    #[error("Directory bind failed: {0}")]
    Bind(String),

    /// A search against an open connection failed.
    #[error("Directory operation failed: {0}")]
    Operation(String),

    /// The requested group has no entry under the group base.
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Caller input is missing, malformed or unsafe for a directory query.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Invalid directory configuration.
    #[error("Directory configuration error: {0}")]
    Configuration(String),
}

impl DirectoryError {
    /// Creates a bind error.
    #[must_use]
    pub fn bind(msg: impl Into<String>) -> Self {
        Self::Bind(msg.into())
    }

    /// Creates an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Creates an input validation error.
    #[must_use]
    pub fn input(msg: impl Into<String>) -> Self {
        Self::InputValidation(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Checks if this error stems from directory infrastructure rather than the caller.
    #[must_use]
    pub const fn is_infrastructure_error(&self) -> bool {
        matches!(
            self,
            Self::Bind(_) | Self::Operation(_) | Self::Configuration(_)
        )
    }

    /// Checks if this error is a rejection of the caller's request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::GroupNotFound(_) | Self::InputValidation(_)
        )
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
