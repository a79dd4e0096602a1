// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token and challenge/response types for authenticating workers and clients
//! to the coordinator.

use crate::define_id;
use serde::{Deserialize, Serialize};

define_id! {
    /// Opaque bearer credential. The value itself is generated from an
    /// OS-backed RNG by the issuing side; this type only carries it.
    pub struct AuthToken;
}

define_id! {
    /// Identifies a single-use challenge issued to a connecting peer.
    pub struct ChallengeId;
}

/// What a token authorizes its holder to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// A build worker registering to accept jobs.
    Worker,
    /// A coordinator administrator (shutdown, drain, config reload).
    Admin,
    /// A build client submitting jobs.
    Client,
    /// A short-lived token scoped to a single build session.
    Session,
}

/// Fine-grained permissions a token carries, independent of its [`TokenKind`]
/// default so an admin can mint a restricted token for a one-off job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub can_submit_jobs: bool,
    pub can_accept_jobs: bool,
    pub can_read_cache: bool,
    pub can_write_cache: bool,
    pub can_administer: bool,
}

impl Permissions {
    pub const NONE: Self = Self {
        can_submit_jobs: false,
        can_accept_jobs: false,
        can_read_cache: false,
        can_write_cache: false,
        can_administer: false,
    };

    pub fn for_kind(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Worker => Self {
                can_accept_jobs: true,
                can_read_cache: true,
                can_write_cache: true,
                ..Self::NONE
            },
            TokenKind::Admin => Self {
                can_submit_jobs: true,
                can_accept_jobs: true,
                can_read_cache: true,
                can_write_cache: true,
                can_administer: true,
            },
            TokenKind::Client => Self {
                can_submit_jobs: true,
                can_read_cache: true,
                ..Self::NONE
            },
            TokenKind::Session => Self {
                can_submit_jobs: true,
                can_read_cache: true,
                ..Self::NONE
            },
        }
    }
}

/// A minted credential tracked by the coordinator's auth state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: AuthToken,
    pub kind: TokenKind,
    pub permissions: Permissions,
    pub issued_at_unix_ms: i64,
    pub expires_at_unix_ms: Option<i64>,
    pub revoked: bool,
    /// Empty means unrestricted. Non-empty restricts `validate_from_host`
    /// to callers presenting one of these hosts.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl IssuedToken {
    pub fn new(
        token: AuthToken,
        kind: TokenKind,
        issued_at_unix_ms: i64,
        ttl_ms: Option<i64>,
    ) -> Self {
        Self {
            permissions: Permissions::for_kind(kind),
            token,
            kind,
            issued_at_unix_ms,
            expires_at_unix_ms: ttl_ms.map(|ttl| issued_at_unix_ms + ttl),
            revoked: false,
            allowed_hosts: Vec::new(),
        }
    }

    pub fn with_allowed_hosts(mut self, allowed_hosts: Vec<String>) -> Self {
        self.allowed_hosts = allowed_hosts;
        self
    }

    pub fn is_expired(&self, now_unix_ms: i64) -> bool {
        matches!(self.expires_at_unix_ms, Some(exp) if now_unix_ms >= exp)
    }

    /// `allowed_hosts` is empty (no restriction) or contains `source_host`.
    pub fn host_is_allowed(&self, source_host: &str) -> bool {
        self.allowed_hosts.is_empty() || self.allowed_hosts.iter().any(|h| h == source_host)
    }
}

/// A single-use challenge issued to a peer that must echo back a derived
/// response before a session is considered authenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub id: ChallengeId,
    pub nonce: String,
    pub expected_response: String,
    pub issued_at_unix_ms: i64,
    pub expires_at_unix_ms: i64,
    /// Flips to `true` on the first verification attempt, win or lose --
    /// a challenge is single-use regardless of outcome.
    pub consumed: bool,
}

impl AuthChallenge {
    pub fn new(
        id: ChallengeId,
        nonce: impl Into<String>,
        expected_response: impl Into<String>,
        issued_at_unix_ms: i64,
        expires_at_unix_ms: i64,
    ) -> Self {
        Self {
            id,
            nonce: nonce.into(),
            expected_response: expected_response.into(),
            issued_at_unix_ms,
            expires_at_unix_ms,
            consumed: false,
        }
    }

    pub fn is_expired(&self, now_unix_ms: i64) -> bool {
        now_unix_ms >= self.expires_at_unix_ms
    }
}

/// Result of validating a token or a challenge response. Kept as a
/// dedicated enum (rather than a bool) so callers can log and act on the
/// specific reason auth failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOutcome {
    Success,
    Invalid,
    Expired,
    Revoked,
    NotAuthorized,
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
