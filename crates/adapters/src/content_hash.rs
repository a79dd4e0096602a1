// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Computes the cache key a build step's inputs hash to.

use boe_core::cache::CacheKey;
use sha2::{Digest, Sha256};

/// The fields that determine whether two build steps are cache-equivalent.
/// Order matters: fields are joined with [`CacheKey::SEPARATOR`] in the
/// order given here, so changing the order changes every existing key.
#[derive(Debug, Clone)]
pub struct HashInputs<'a> {
    pub compiler_id: &'a str,
    pub compiler_version: &'a str,
    /// Hashed in sorted order, so `-O2 -g` and `-g -O2` key identically.
    pub flags: &'a [String],
    pub source_digest: &'a str,
    pub dependency_digests: &'a [String],
}

/// Computes a [`CacheKey`] over a build step's inputs.
///
/// Fields are joined by [`CacheKey::SEPARATOR`], a control character that
/// cannot appear in any of them, so no combination of inputs can alias
/// onto another combination's key.
pub fn hash_build_inputs(inputs: &HashInputs<'_>) -> CacheKey {
    let mut hasher = Sha256::new();
    let sep = CacheKey::SEPARATOR.as_bytes();

    hasher.update(inputs.compiler_id.as_bytes());
    hasher.update(sep);
    hasher.update(inputs.compiler_version.as_bytes());
    hasher.update(sep);
    let mut sorted_flags: Vec<&str> = inputs.flags.iter().map(String::as_str).collect();
    sorted_flags.sort_unstable();
    for flag in &sorted_flags {
        hasher.update(flag.as_bytes());
        hasher.update(sep);
    }
    hasher.update(inputs.source_digest.as_bytes());
    hasher.update(sep);
    for dep in inputs.dependency_digests {
        hasher.update(dep.as_bytes());
        hasher.update(sep);
    }

    CacheKey::from_digest(hex::encode(hasher.finalize()))
}

/// Computes the digest of a single file's content, for use as a
/// `source_digest` or one of a project's `dependency_digests`.
pub fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[path = "content_hash_tests.rs"]
mod tests;
