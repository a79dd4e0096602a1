// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token lifecycle and challenge/response authentication for the
//! coordinator.
//!
//! The existing HMAC-equivalent primitive this module stands in for is a
//! known-weak placeholder, not reimplemented here: challenge responses
//! are opaque strings the caller derives however it likes (a real MAC in
//! production), and this module only enforces single-use/expiry
//! semantics around them.

use base64::Engine;
use boe_core::auth::{AuthChallenge, AuthOutcome, AuthToken, ChallengeId, IssuedToken, TokenKind};
use parking_lot::Mutex;
use rand::RngCore;

/// Default bound on concurrently outstanding challenges.
pub const DEFAULT_CHALLENGE_SLOTS: usize = 100;

/// Unordered token store: generate, validate, revoke, refresh, expire.
/// Iteration order over tokens is never observable from the public API.
pub struct AuthManager {
    tokens: Mutex<Vec<IssuedToken>>,
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthManager {
    pub fn new() -> Self {
        Self { tokens: Mutex::new(Vec::new()) }
    }

    /// Mints a new token: a random 32-byte value, base64-encoded, with
    /// permissions defaulted per `kind`.
    pub fn generate(&self, kind: TokenKind, now_unix_ms: i64, ttl_ms: Option<i64>) -> IssuedToken {
        self.generate_scoped(kind, now_unix_ms, ttl_ms, Vec::new())
    }

    /// Like [`Self::generate`], but restricts the token to `allowed_hosts`
    /// (checked by [`Self::validate_from_host`]; empty means unrestricted).
    pub fn generate_scoped(
        &self,
        kind: TokenKind,
        now_unix_ms: i64,
        ttl_ms: Option<i64>,
        allowed_hosts: Vec<String>,
    ) -> IssuedToken {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let value = base64::engine::general_purpose::STANDARD.encode(bytes);
        let token = IssuedToken::new(AuthToken::new(value), kind, now_unix_ms, ttl_ms)
            .with_allowed_hosts(allowed_hosts);
        self.tokens.lock().push(token.clone());
        token
    }

    /// `Success` iff the token exists, isn't revoked, and (if it has a
    /// TTL) hasn't expired. Expired and revoked are reported as distinct
    /// outcomes, never collapsed. Does not check `allowed_hosts` -- use
    /// [`Self::validate_from_host`] when the caller's host is known.
    pub fn validate(&self, value: &AuthToken, now_unix_ms: i64) -> AuthOutcome {
        self.validate_from_host(value, now_unix_ms, None)
    }

    /// Full form of [`Self::validate`]: when `source_host` is `Some`, also
    /// enforces the token's `allowed_hosts`.
    pub fn validate_from_host(
        &self,
        value: &AuthToken,
        now_unix_ms: i64,
        source_host: Option<&str>,
    ) -> AuthOutcome {
        let tokens = self.tokens.lock();
        let Some(token) = tokens.iter().find(|t| &t.token == value) else {
            return AuthOutcome::Invalid;
        };
        if token.revoked {
            return AuthOutcome::Revoked;
        }
        if token.is_expired(now_unix_ms) {
            return AuthOutcome::Expired;
        }
        if let Some(host) = source_host {
            if !token.host_is_allowed(host) {
                return AuthOutcome::NotAuthorized;
            }
        }
        AuthOutcome::Success
    }

    /// Checks `value` authorizes `permission` (a projection of
    /// [`boe_core::auth::Permissions`]), returning `NotAuthorized` when the
    /// token is otherwise valid but lacks it.
    pub fn authorize(&self, value: &AuthToken, now_unix_ms: i64, permission: impl Fn(&boe_core::auth::Permissions) -> bool) -> AuthOutcome {
        let tokens = self.tokens.lock();
        let Some(token) = tokens.iter().find(|t| &t.token == value) else {
            return AuthOutcome::Invalid;
        };
        if token.revoked {
            return AuthOutcome::Revoked;
        }
        if token.is_expired(now_unix_ms) {
            return AuthOutcome::Expired;
        }
        if !permission(&token.permissions) {
            return AuthOutcome::NotAuthorized;
        }
        AuthOutcome::Success
    }

    /// Marks a token revoked; subsequent `validate` calls return `Revoked`.
    /// Returns `false` if `value` isn't a known token.
    pub fn revoke(&self, value: &AuthToken) -> bool {
        let mut tokens = self.tokens.lock();
        match tokens.iter_mut().find(|t| &t.token == value) {
            Some(token) => {
                token.revoked = true;
                true
            }
            None => false,
        }
    }

    /// Extends `value`'s expiry by `extra_ttl_ms`, or clears the TTL
    /// entirely if the token had none. Refusing to refresh a revoked token
    /// is the caller's policy decision (check `validate` first); this just
    /// moves the expiry.
    pub fn refresh(&self, value: &AuthToken, extra_ttl_ms: i64) -> bool {
        let mut tokens = self.tokens.lock();
        match tokens.iter_mut().find(|t| &t.token == value) {
            Some(token) => {
                if let Some(expires_at) = &mut token.expires_at_unix_ms {
                    *expires_at += extra_ttl_ms;
                }
                true
            }
            None => false,
        }
    }

    /// Registers an externally-supplied token value (e.g. a pre-shared
    /// secret handed to `boe coordinator start --token`) rather than
    /// minting a fresh random one. An existing entry for the same value
    /// is replaced outright.
    pub fn issue_known(&self, value: AuthToken, kind: TokenKind, now_unix_ms: i64, ttl_ms: Option<i64>) -> IssuedToken {
        let token = IssuedToken::new(value.clone(), kind, now_unix_ms, ttl_ms);
        let mut tokens = self.tokens.lock();
        tokens.retain(|t| t.token != value);
        tokens.push(token.clone());
        token
    }

    /// Removes every token whose expiry has passed. Returns the count removed.
    pub fn cleanup_expired(&self, now_unix_ms: i64) -> usize {
        let mut tokens = self.tokens.lock();
        let before = tokens.len();
        tokens.retain(|t| !t.is_expired(now_unix_ms));
        before - tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeError {
    /// All slots hold a still-live, unused challenge.
    Full,
}

/// Bounded slot array of outstanding challenges (C11's other half). Full
/// once `capacity` unexpired-and-unused challenges are outstanding at once;
/// `create` purges expired/used entries first to reclaim slots.
pub struct ChallengeStore {
    capacity: usize,
    slots: Mutex<Vec<AuthChallenge>>,
}

impl ChallengeStore {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, slots: Mutex::new(Vec::new()) }
    }

    /// Issues a challenge with `nonce`/`expected_response` valid until
    /// `expires_at_unix_ms`. Returns `None` if every slot holds a live,
    /// unconsumed challenge.
    pub fn create(
        &self,
        id: ChallengeId,
        nonce: impl Into<String>,
        expected_response: impl Into<String>,
        now_unix_ms: i64,
        expires_at_unix_ms: i64,
    ) -> Result<AuthChallenge, ChallengeError> {
        let mut slots = self.slots.lock();
        slots.retain(|c| !c.consumed && !c.is_expired(now_unix_ms));
        if slots.len() >= self.capacity {
            return Err(ChallengeError::Full);
        }
        let challenge = AuthChallenge::new(id, nonce, expected_response, now_unix_ms, expires_at_unix_ms);
        slots.push(challenge.clone());
        Ok(challenge)
    }

    /// Verifies `response` against the challenge `id`. Marks the challenge
    /// consumed regardless of the outcome (single-use, even on failure).
    pub fn verify(&self, id: &ChallengeId, response: &str, now_unix_ms: i64) -> AuthOutcome {
        let mut slots = self.slots.lock();
        let Some(challenge) = slots.iter_mut().find(|c| &c.id == id) else {
            return AuthOutcome::Invalid;
        };
        if challenge.consumed {
            return AuthOutcome::Invalid;
        }
        let expired = challenge.is_expired(now_unix_ms);
        challenge.consumed = true;
        if expired {
            return AuthOutcome::Expired;
        }
        if challenge.expected_response == response {
            AuthOutcome::Success
        } else {
            AuthOutcome::Invalid
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHALLENGE_SLOTS)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
