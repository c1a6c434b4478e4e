//! Token revocation registry.
//!
//! Tracks revoked token IDs for the life of the process. Each entry keeps the
//! expiry of the token it revokes so entries can be dropped once that token
//! would fail verification as expired anyway.

use dashmap::DashMap;

/// Concurrent set of revoked token IDs.
///
/// Construct once at startup and share it through an `Arc`.
#[derive(Debug, Default)]
pub struct RevocationRegistry {
    /// Token ID to token expiry (Unix timestamp).
    revoked: DashMap<String, i64>,
}

impl RevocationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Revokes a token ID.
    ///
    /// Returns `true` if the ID was not already revoked. Revoking again keeps
    /// the later expiry.
    pub fn revoke(&self, jti: &str, exp: i64) -> bool {
        let mut newly_revoked = false;
        self.revoked
            .entry(jti.to_string())
            .and_modify(|current| *current = (*current).max(exp))
            .or_insert_with(|| {
                newly_revoked = true;
                exp
            });
        newly_revoked
    }

    /// Checks if a token ID is revoked.
    #[must_use]
    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    /// Number of revoked IDs held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    /// Returns true when nothing is revoked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    /// Drops entries whose token expired before `now`. Returns how many were dropped.
    pub fn prune_expired(&self, now: i64) -> usize {
        let before = self.revoked.len();
        self.revoked.retain(|_, exp| *exp >= now);
        let pruned = before.saturating_sub(self.revoked.len());
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.revoked.len(), "pruned expired revocations");
        }
        pruned
    }
}
