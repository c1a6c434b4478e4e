//! Token configuration.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::error::{TokenError, TokenResult};

/// Default access token lifespan in seconds.
pub const DEFAULT_ACCESS_TOKEN_LIFESPAN: i64 = 1_800;

/// Default refresh token lifespan in seconds.
pub const DEFAULT_REFRESH_TOKEN_LIFESPAN: i64 = 86_400;

/// Shared-secret signing algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    #[default]
    Hs256,
    /// HMAC with SHA-384.
    Hs384,
    /// HMAC with SHA-512.
    Hs512,
}

impl SigningAlgorithm {
    /// Returns the JWA name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }

    /// Returns the `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn jwt_algorithm(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Hs384 => Algorithm::HS384,
            Self::Hs512 => Algorithm::HS512,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HS256" => Ok(Self::Hs256),
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            other => Err(TokenError::config(format!(
                "unsupported signing algorithm: {other}"
            ))),
        }
    }
}

/// Token configuration.
#[derive(Clone)]
pub struct TokenConfig {
    /// Signing secret.
    pub secret: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Access token lifespan in seconds.
    pub access_token_lifespan: i64,

    /// Refresh token lifespan in seconds.
    pub refresh_token_lifespan: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: SigningAlgorithm::default(),
            access_token_lifespan: DEFAULT_ACCESS_TOKEN_LIFESPAN,   // 30 minutes
            refresh_token_lifespan: DEFAULT_REFRESH_TOKEN_LIFESPAN, // 1 day
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("access_token_lifespan", &self.access_token_lifespan)
            .field("refresh_token_lifespan", &self.refresh_token_lifespan)
            .finish()
    }
}

impl TokenConfig {
    /// Creates a configuration with default lifetimes.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if the secret is empty or a
    /// lifespan is not positive.
    pub fn validate(&self) -> TokenResult<()> {
        if self.secret.is_empty() {
            return Err(TokenError::config("signing secret cannot be empty"));
        }
        if self.access_token_lifespan <= 0 {
            return Err(TokenError::config("access token lifespan must be positive"));
        }
        if self.refresh_token_lifespan <= 0 {
            return Err(TokenError::config("refresh token lifespan must be positive"));
        }
        Ok(())
    }
}
