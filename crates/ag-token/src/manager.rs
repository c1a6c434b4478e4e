//! Token issuance, verification and revocation.
//!
//! Tokens are HMAC-signed JWTs carrying a [`TokenPayload`]. Verification
//! checks signature, expiry (with zero leeway), kind and revocation, in that
//! order, so an elapsed token always reports expiry.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::claims::{TokenKind, TokenPayload, UserData};
use crate::config::TokenConfig;
use crate::error::{TokenError, TokenResult};
use crate::revocation::RevocationRegistry;

/// Token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Refresh token (if issued).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type (always "bearer").
    pub token_type: String,
}

impl TokenResponse {
    /// Creates a bearer response.
    #[must_use]
    pub fn bearer(access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Issues, verifies and revokes tokens.
pub struct TokenManager {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    registry: Arc<RevocationRegistry>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("config", &self.config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .field("revoked", &self.registry.len())
            .finish()
    }
}

/// How a failure is reported for each token kind.
#[derive(Clone, Copy)]
enum Expect {
    Access,
    Refresh,
}

impl Expect {
    const fn kind(self) -> TokenKind {
        match self {
            Self::Access => TokenKind::Access,
            Self::Refresh => TokenKind::Refresh,
        }
    }

    fn expired(self) -> TokenError {
        match self {
            Self::Access => TokenError::Expired,
            Self::Refresh => TokenError::RefreshExpired,
        }
    }

    fn invalid(self, msg: impl Into<String>) -> TokenError {
        match self {
            Self::Access => TokenError::invalid(msg),
            Self::Refresh => TokenError::refresh_invalid(msg),
        }
    }

    fn wrong_kind(self) -> TokenError {
        match self {
            Self::Access => TokenError::Revoked("not an access token".to_string()),
            Self::Refresh => TokenError::refresh_invalid("not a refresh token"),
        }
    }

    fn revoked(self, msg: &str) -> TokenError {
        match self {
            Self::Access => TokenError::Revoked(msg.to_string()),
            Self::Refresh => TokenError::RefreshRevoked,
        }
    }
}

impl TokenManager {
    /// Creates a token manager.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if the configuration is invalid.
    pub fn new(config: TokenConfig, registry: Arc<RevocationRegistry>) -> TokenResult<Self> {
        config.validate()?;
        let secret = config.secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config,
            registry,
        })
    }

    /// Returns the token configuration.
    #[must_use]
    pub const fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Returns the revocation registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<RevocationRegistry> {
        &self.registry
    }

    /// Issues an access/refresh pair embedding `user`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if `user` does not serialize to a JSON
    /// object or signing fails.
    pub fn create_tokens<U: Serialize + ?Sized>(&self, user: &U) -> TokenResult<TokenResponse> {
        let user = match serde_json::to_value(user) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => {
                return Err(TokenError::Signing(
                    "user data must be a JSON object".to_string(),
                ));
            }
            Err(e) => return Err(TokenError::Signing(e.to_string())),
        };
        self.issue_at(user, Utc::now().timestamp())
    }

    fn issue_at(&self, user: UserData, now: i64) -> TokenResult<TokenResponse> {
        let access = TokenPayload::new(
            user.clone(),
            TokenKind::Access,
            now,
            self.config.access_token_lifespan,
        );
        let refresh = TokenPayload::new(
            user,
            TokenKind::Refresh,
            now,
            self.config.refresh_token_lifespan,
        );

        let response = TokenResponse::bearer(self.sign(&access)?, Some(self.sign(&refresh)?));
        tracing::debug!(sub = ?access.sub, exp = access.exp, "issued token pair");
        Ok(response)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> TokenResult<String> {
        let header = Header::new(self.config.algorithm.jwt_algorithm());
        encode(&header, claims, &self.encoding_key).map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn validation(&self, check_expiry: bool) -> Validation {
        let mut validation = Validation::new(self.config.algorithm.jwt_algorithm());
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.validate_exp = check_expiry;
        if !check_expiry {
            validation.required_spec_claims.clear();
        }
        validation
    }

    fn decode_as(
        &self,
        token: &str,
        expect: Expect,
        check_expiry: bool,
    ) -> TokenResult<TokenPayload> {
        decode::<TokenPayload>(token, &self.decoding_key, &self.validation(check_expiry))
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => expect.expired(),
                _ => expect.invalid(e.to_string()),
            })
    }

    fn verify(&self, token: &str, expect: Expect) -> TokenResult<TokenPayload> {
        let payload = self.decode_as(token, expect, true).inspect_err(|e| {
            tracing::warn!(kind = expect.kind().as_str(), error = %e, "token rejected");
        })?;

        if payload.kind != expect.kind() {
            tracing::warn!(expected = expect.kind().as_str(), "token kind mismatch");
            return Err(expect.wrong_kind());
        }

        let Some(jti) = payload.jti.as_deref() else {
            tracing::warn!(kind = expect.kind().as_str(), "token has no ID");
            return Err(expect.revoked("token has no ID"));
        };

        if self.registry.is_revoked(jti) {
            tracing::warn!(jti, "revoked token presented");
            return Err(expect.revoked("token has been revoked"));
        }

        Ok(payload)
    }

    /// Verifies an access token and returns its payload.
    ///
    /// # Errors
    ///
    /// - `Invalid` if the token is malformed or its signature does not verify.
    /// - `Expired` if the token has expired.
    /// - `Revoked` if the token is revoked, has no ID, or is not an access token.
    pub fn verify_access_token(&self, token: &str) -> TokenResult<TokenPayload> {
        self.verify(token, Expect::Access)
    }

    /// Verifies a refresh token and returns its payload.
    ///
    /// # Errors
    ///
    /// - `RefreshExpired` if the token has expired.
    /// - `RefreshInvalid` if the token is malformed, unsigned or not a refresh token.
    /// - `RefreshRevoked` if the token is revoked or has no ID.
    pub fn verify_refresh_token(&self, token: &str) -> TokenResult<TokenPayload> {
        self.verify(token, Expect::Refresh)
    }

    /// Returns `true` if this call revoked the token, `false` if it already was.
    fn revoke(&self, token: &str, expect: Expect, require_kind: bool) -> TokenResult<bool> {
        let payload = self.decode_as(token, expect, false)?;

        if require_kind && payload.kind != expect.kind() {
            return Err(expect.invalid("not a refresh token"));
        }

        let jti = payload
            .jti
            .as_deref()
            .ok_or_else(|| expect.invalid("token has no ID"))?;

        let newly_revoked = self.registry.revoke(jti, payload.exp);
        if newly_revoked {
            tracing::info!(jti, kind = payload.kind.as_str(), "token revoked");
        }
        Ok(newly_revoked)
    }

    /// Revokes an access token. Expired tokens can still be revoked.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the token cannot be decoded or has no ID.
    pub fn revoke_access_token(&self, token: &str) -> TokenResult<()> {
        self.revoke(token, Expect::Access, false).map(|_| ())
    }

    /// Revokes a refresh token. Expired tokens can still be revoked.
    ///
    /// # Errors
    ///
    /// Returns `RefreshInvalid` if the token cannot be decoded, has no ID or
    /// is not a refresh token.
    pub fn revoke_refresh_token(&self, token: &str) -> TokenResult<()> {
        self.revoke(token, Expect::Refresh, true).map(|_| ())
    }

    /// Exchanges a refresh token for a new pair, revoking the presented one.
    ///
    /// Only one exchange of a given refresh token can succeed, even when
    /// several run concurrently.
    ///
    /// # Errors
    ///
    /// Returns the refresh verification errors, `RefreshRevoked` if another
    /// exchange already spent the token, or `Signing` if issuing fails.
    pub fn exchange_refresh_token(&self, token: &str) -> TokenResult<TokenResponse> {
        let payload = self.verify_refresh_token(token)?;
        if !self.revoke(token, Expect::Refresh, true)? {
            tracing::warn!(jti = payload.jti.as_deref(), "refresh token already spent");
            return Err(TokenError::RefreshRevoked);
        }
        self.issue_at(payload.user, Utc::now().timestamp())
    }

    /// Drops revocations for tokens that have already expired.
    pub fn prune_revocations(&self) -> usize {
        self.registry.prune_expired(Utc::now().timestamp())
    }
}
