//! Token error types.
//!
//! Messages never include token contents.

use thiserror::Error;

/// Errors raised while issuing, verifying or revoking tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The access token has expired.
    #[error("Token has expired")]
    Expired,

    /// The access token is malformed or its signature does not verify.
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// The access token was revoked, has no ID, or is not an access token.
    #[error("Token has been revoked: {0}")]
    Revoked(String),

    /// The refresh token has expired.
    #[error("Refresh token has expired")]
    RefreshExpired,

    /// The refresh token is malformed, unsigned or not a refresh token.
    #[error("Invalid refresh token: {0}")]
    RefreshInvalid(String),

    /// The refresh token was revoked or has no ID.
    #[error("Refresh token has been revoked")]
    RefreshRevoked,

    /// Encoding or signing a token failed.
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Invalid token configuration.
    #[error("Token configuration error: {0}")]
    Configuration(String),
}

impl TokenError {
    /// Creates an invalid access token error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Creates an invalid refresh token error.
    #[must_use]
    pub fn refresh_invalid(msg: impl Into<String>) -> Self {
        Self::RefreshInvalid(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Checks if the error means the presented token can no longer be used.
    #[must_use]
    pub const fn is_revoked_class(&self) -> bool {
        matches!(self, Self::Revoked(_) | Self::RefreshRevoked)
    }

    /// Checks if the error means the token's lifetime elapsed.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired | Self::RefreshExpired)
    }

    /// Checks if the error is a server-side fault rather than a bad token.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Signing(_) | Self::Configuration(_))
    }
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes() {
        assert!(TokenError::Revoked("revoked".into()).is_revoked_class());
        assert!(TokenError::RefreshRevoked.is_revoked_class());
        assert!(!TokenError::Expired.is_revoked_class());

        assert!(TokenError::Expired.is_expired());
        assert!(TokenError::RefreshExpired.is_expired());
        assert!(!TokenError::invalid("bad").is_expired());

        assert!(TokenError::Signing("key".into()).is_internal());
        assert!(!TokenError::refresh_invalid("kind").is_internal());
    }
}
