// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed identifiers and metadata for the artifact cache.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::PathBuf;

/// A 64-character lowercase-hex SHA-256 digest identifying a cache entry.
///
/// Computed over a build step's inputs (compiler version, flags, source
/// content, dependency digests) joined by a control character that cannot
/// appear in any of those fields, so no field-boundary collision is
/// possible. See [`Self::SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Joins hashed fields; chosen because it cannot occur in paths, flags,
    /// or source text, so concatenating fields with it cannot alias two
    /// distinct input tuples onto the same digest.
    pub const SEPARATOR: &'static str = "\u{1}";

    /// Wraps an already-computed 64-character hex digest.
    pub fn from_digest(digest: impl Into<String>) -> Self {
        let digest = digest.into();
        debug_assert_eq!(digest.len(), 64, "cache key must be a 64-character hex digest");
        debug_assert!(
            digest.chars().all(|c| c.is_ascii_hexdigit()),
            "cache key must be lowercase hex"
        );
        debug_assert!(
            !digest.contains(Self::SEPARATOR),
            "digest cannot contain the field separator"
        );
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character prefix used as the first level of the on-disk
    /// fan-out directory layout (`<cache_dir>/<xx>/<key>`).
    pub fn shard_prefix(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CacheKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Category of build output an [`ArtifactEntry`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactType {
    Object,
    StaticLib,
    SharedLib,
    Executable,
    PCH,
    Archive,
    Other,
}

/// Metadata tracked by the cache for one stored artifact. The bytes
/// themselves live on disk (or in a remote tier); this is the index row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub key: CacheKey,
    pub artifact_type: ArtifactType,
    pub size_bytes: u64,
    pub relative_path: PathBuf,
    pub created_at_unix_ms: i64,
    pub last_accessed_unix_ms: i64,
    pub hit_count: u64,
}

impl ArtifactEntry {
    pub fn new(
        key: CacheKey,
        artifact_type: ArtifactType,
        size_bytes: u64,
        relative_path: PathBuf,
        now_unix_ms: i64,
    ) -> Self {
        Self {
            key,
            artifact_type,
            size_bytes,
            relative_path,
            created_at_unix_ms: now_unix_ms,
            last_accessed_unix_ms: now_unix_ms,
            hit_count: 0,
        }
    }

    pub fn touch(&mut self, now_unix_ms: i64) {
        self.last_accessed_unix_ms = now_unix_ms;
        self.hit_count += 1;
    }
}

/// Outcome of an artifact cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheLookup {
    Miss,
    HitLocal,
    HitRemote,
    /// Another worker is currently producing this artifact; the caller
    /// should wait rather than rebuild.
    HitPending,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::HitLocal | Self::HitRemote)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
