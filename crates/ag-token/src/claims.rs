//! Token payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{TokenError, TokenResult};

/// User data embedded in a token, as a JSON object.
pub type UserData = serde_json::Map<String, serde_json::Value>;

/// Subject used in token IDs when the user has no name.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Token kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer token for API calls.
    Access,
    /// Long-lived token exchanged for a new pair.
    Refresh,
}

impl TokenKind {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Signed token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Subject: the user's common name, else their user ID.
    pub sub: Option<String>,

    /// Token ID, `{subject}:{kind}:{iat}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Embedded user data.
    #[serde(default)]
    pub user: UserData,

    /// Token kind.
    #[serde(rename = "scope")]
    pub kind: TokenKind,
}

impl TokenPayload {
    /// Builds a payload for `user` issued at `iat` and living `lifespan` seconds.
    #[must_use]
    pub fn new(user: UserData, kind: TokenKind, iat: i64, lifespan: i64) -> Self {
        let sub = subject_of(&user);
        let jti = format!(
            "{}:{}:{iat}",
            sub.as_deref().unwrap_or(ANONYMOUS_SUBJECT),
            kind.as_str()
        );
        Self {
            exp: iat + lifespan,
            iat,
            sub,
            jti: Some(jti),
            user,
            kind,
        }
    }

    /// Deserializes the embedded user data into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the data does not fit `T`.
    pub fn user_as<T: DeserializeOwned>(&self) -> TokenResult<T> {
        serde_json::from_value(serde_json::Value::Object(self.user.clone()))
            .map_err(|e| TokenError::invalid(format!("unexpected user data: {e}")))
    }
}

/// Picks the subject from user data: `cn`, falling back to `uid`.
fn subject_of(user: &UserData) -> Option<String> {
    ["cn", "uid"].into_iter().find_map(|key| {
        user.get(key)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user(value: serde_json::Value) -> UserData {
        match value {
            serde_json::Value::Object(map) => map,
            _ => UserData::new(),
        }
    }

    #[test]
    fn jti_uses_subject_kind_and_issue_time() {
        let payload = TokenPayload::new(
            user(json!({"cn": "alice", "uid": "a1"})),
            TokenKind::Access,
            1_700_000_000,
            1800,
        );
        assert_eq!(payload.sub.as_deref(), Some("alice"));
        assert_eq!(payload.jti.as_deref(), Some("alice:access:1700000000"));
        assert_eq!(payload.exp, 1_700_001_800);
    }

    #[test]
    fn subject_falls_back_to_uid_then_anonymous() {
        let by_uid = TokenPayload::new(user(json!({"cn": null, "uid": "a1"})), TokenKind::Refresh, 10, 5);
        assert_eq!(by_uid.sub.as_deref(), Some("a1"));

        let anonymous = TokenPayload::new(UserData::new(), TokenKind::Refresh, 10, 5);
        assert!(anonymous.sub.is_none());
        assert_eq!(anonymous.jti.as_deref(), Some("anonymous:refresh:10"));
    }

    #[test]
    fn kind_travels_in_scope_claim() {
        let payload = TokenPayload::new(user(json!({"cn": "bob"})), TokenKind::Refresh, 10, 5);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["scope"], "refresh");
        assert_eq!(value["user"]["cn"], "bob");
    }

    #[test]
    fn payload_without_jti_deserializes() {
        let payload: TokenPayload = serde_json::from_value(json!({
            "exp": 20, "iat": 10, "sub": null, "user": {}, "scope": "access"
        }))
        .unwrap();
        assert!(payload.jti.is_none());
        assert_eq!(payload.exp, 20);
    }
}
