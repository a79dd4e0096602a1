// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressable artifact store: a local disk-backed blob
//! store with LRU eviction, hit/miss accounting, and a seam for an
//! optional remote tier shared across a worker fleet.

use boe_core::cache::{ArtifactEntry, ArtifactType, CacheKey, CacheLookup};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("source path does not exist: {0}")]
    SourceMissing(PathBuf),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Tunable limits for [`ArtifactCache`]. `eviction_threshold` triggers
/// opportunistic eviction before a new `store` is accepted, once
/// `total_size_bytes / max_bytes` crosses it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    pub max_bytes: u64,
    pub max_entries: Option<usize>,
    pub eviction_threshold: f64,
    pub max_age_ms: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024 * 1024,
            max_entries: None,
            eviction_threshold: 0.9,
            max_age_ms: 30 * 24 * 60 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits_local: u64,
    pub hits_remote: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Hook point for a remote cache tier shared across workers. Guarantees
/// a correctly functioning local-only cache when this is a stub --
/// [`NullRemoteTier`] is exactly that stub.
pub trait RemoteTier: Send + Sync {
    fn fetch_remote(&self, _key: &CacheKey) -> Option<Vec<u8>> {
        None
    }

    fn push_remote(&self, _key: &CacheKey, _bytes: &[u8]) -> bool {
        false
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullRemoteTier;

impl RemoteTier for NullRemoteTier {}

struct Inner {
    entries: HashMap<CacheKey, ArtifactEntry>,
    total_size: u64,
    stats: CacheStats,
}

impl Inner {
    /// Picks the LRU victim: oldest `last_accessed`, ties broken by
    /// smaller `hit_count` then older `created_at`.
    fn lru_victim(&self) -> Option<CacheKey> {
        self.entries
            .values()
            .min_by(|a, b| {
                a.last_accessed_unix_ms
                    .cmp(&b.last_accessed_unix_ms)
                    .then(a.hit_count.cmp(&b.hit_count))
                    .then(a.created_at_unix_ms.cmp(&b.created_at_unix_ms))
            })
            .map(|e| e.key.clone())
    }
}

/// Key -> entry map plus a disk directory keyed by the first byte-pair of
/// the key, bounding per-directory fan-out to 256 subdirectories.
pub struct ArtifactCache<R: RemoteTier = NullRemoteTier> {
    cache_dir: PathBuf,
    config: CacheConfig,
    inner: Mutex<Inner>,
    remote: R,
}

impl ArtifactCache<NullRemoteTier> {
    pub fn new(cache_dir: impl Into<PathBuf>, config: CacheConfig) -> Self {
        Self::with_remote(cache_dir, config, NullRemoteTier)
    }
}

impl<R: RemoteTier> ArtifactCache<R> {
    pub fn with_remote(cache_dir: impl Into<PathBuf>, config: CacheConfig, remote: R) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            config,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                total_size: 0,
                stats: CacheStats::default(),
            }),
            remote,
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    pub fn total_size(&self) -> u64 {
        self.inner.lock().total_size
    }

    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    fn blob_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.shard_prefix()).join(key.as_str())
    }

    pub fn lookup(&self, key: &CacheKey, now_unix_ms: i64) -> CacheLookup {
        {
            let mut inner = self.inner.lock();
            if let Some(entry) = inner.entries.get_mut(key) {
                entry.touch(now_unix_ms);
                inner.stats.hits_local += 1;
                return CacheLookup::HitLocal;
            }
        }
        if self.remote.fetch_remote(key).is_some() {
            self.inner.lock().stats.hits_remote += 1;
            return CacheLookup::HitRemote;
        }
        self.inner.lock().stats.misses += 1;
        CacheLookup::Miss
    }

    pub fn get(&self, key: &CacheKey) -> Option<ArtifactEntry> {
        self.inner.lock().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn retrieve(&self, key: &CacheKey, dst_path: &Path) -> CacheResult<bool> {
        let Some(entry) = self.get(key) else { return Ok(false) };
        let src = self.blob_path(&entry.key);
        if !src.exists() {
            return Ok(false);
        }
        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&src, dst_path)?;
        Ok(true)
    }

    /// Stores the file at `src_path` under `key`. Idempotent: an existing
    /// key only has its access time touched and its existing entry
    /// returned.
    pub fn store(
        &self,
        key: CacheKey,
        src_path: &Path,
        artifact_type: ArtifactType,
        now_unix_ms: i64,
    ) -> CacheResult<ArtifactEntry> {
        if !src_path.exists() {
            return Err(CacheError::SourceMissing(src_path.to_path_buf()));
        }
        {
            let mut inner = self.inner.lock();
            if let Some(existing) = inner.entries.get_mut(&key) {
                existing.touch(now_unix_ms);
                return Ok(existing.clone());
            }
        }

        self.maybe_evict_before_store();

        let dest = self.blob_path(&key);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src_path, &dest)?;
        let size_bytes = fs::metadata(&dest)?.len();

        let relative = PathBuf::from(key.shard_prefix()).join(key.as_str());
        let entry = ArtifactEntry::new(key.clone(), artifact_type, size_bytes, relative, now_unix_ms);

        let mut inner = self.inner.lock();
        inner.total_size += size_bytes;
        inner.entries.insert(key, entry.clone());
        Ok(entry)
    }

    /// Same as [`Self::store`] but takes bytes directly, via a temp file
    /// so both paths share one write-then-register code path.
    pub fn store_buffer(
        &self,
        key: CacheKey,
        bytes: &[u8],
        artifact_type: ArtifactType,
        now_unix_ms: i64,
    ) -> CacheResult<ArtifactEntry> {
        let tmp_dir = self.cache_dir.join(".tmp");
        fs::create_dir_all(&tmp_dir)?;
        let tmp_path = tmp_dir.join(format!("{}.incoming", key.as_str()));
        fs::write(&tmp_path, bytes)?;
        let result = self.store(key, &tmp_path, artifact_type, now_unix_ms);
        let _ = fs::remove_file(&tmp_path);
        result
    }

    pub fn delete(&self, key: &CacheKey) -> CacheResult<bool> {
        let removed = {
            let mut inner = self.inner.lock();
            match inner.entries.remove(key) {
                Some(entry) => {
                    inner.total_size = inner.total_size.saturating_sub(entry.size_bytes);
                    true
                }
                None => false,
            }
        };
        if removed {
            let path = self.blob_path(key);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(removed)
    }

    pub fn clear(&self) -> CacheResult<()> {
        let keys: Vec<CacheKey> = {
            let mut inner = self.inner.lock();
            let keys: Vec<CacheKey> = inner.entries.keys().cloned().collect();
            inner.entries.clear();
            inner.total_size = 0;
            keys
        };
        for key in keys {
            let path = self.blob_path(&key);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Opportunistic eviction ahead of a `store`, once usage crosses
    /// `eviction_threshold` (default 0.9).
    fn maybe_evict_before_store(&self) {
        let over_bytes = {
            let inner = self.inner.lock();
            let threshold = (self.config.max_bytes as f64 * self.config.eviction_threshold) as u64;
            inner.total_size >= threshold
        };
        if over_bytes {
            self.evict(self.config.max_bytes / 10);
            return;
        }
        let over_entries = self
            .config
            .max_entries
            .map(|max| self.inner.lock().entries.len() >= max)
            .unwrap_or(false);
        if over_entries {
            self.evict_n(1);
        }
    }

    /// Removes entries in LRU order until at least `target_free_bytes`
    /// have been freed, or the cache is empty. Returns bytes actually freed.
    pub fn evict(&self, target_free_bytes: u64) -> u64 {
        let mut freed = 0u64;
        while freed < target_free_bytes {
            let Some(key) = self.inner.lock().lru_victim() else { break };
            let size = self.get(&key).map(|e| e.size_bytes).unwrap_or(0);
            match self.delete(&key) {
                Ok(true) => {
                    freed += size;
                    self.inner.lock().stats.evictions += 1;
                }
                _ => break,
            }
        }
        freed
    }

    fn evict_n(&self, n: usize) {
        for _ in 0..n {
            let Some(key) = self.inner.lock().lru_victim() else { break };
            if matches!(self.delete(&key), Ok(true)) {
                self.inner.lock().stats.evictions += 1;
            }
        }
    }

    /// Removes entries whose age (relative to `now_unix_ms`) exceeds
    /// `max_age_ms`.
    pub fn cleanup(&self, now_unix_ms: i64) -> CacheResult<u64> {
        let stale: Vec<CacheKey> = {
            let inner = self.inner.lock();
            inner
                .entries
                .values()
                .filter(|e| now_unix_ms - e.created_at_unix_ms > self.config.max_age_ms)
                .map(|e| e.key.clone())
                .collect()
        };
        let mut removed = 0u64;
        for key in stale {
            if self.delete(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Checks every entry's blob still exists on disk. With `repair`,
    /// entries whose blob is missing are dropped from the index.
    pub fn verify(&self, repair: bool) -> CacheResult<usize> {
        let missing: Vec<CacheKey> = {
            let inner = self.inner.lock();
            inner
                .entries
                .values()
                .filter(|e| !self.blob_path(&e.key).exists())
                .map(|e| e.key.clone())
                .collect()
        };
        let issue_count = missing.len();
        if repair {
            for key in missing {
                self.delete(&key)?;
            }
        }
        Ok(issue_count)
    }

    pub fn fetch_remote(&self, key: &CacheKey) -> Option<Vec<u8>> {
        self.remote.fetch_remote(key)
    }

    pub fn push_remote(&self, key: &CacheKey, bytes: &[u8]) -> bool {
        self.remote.push_remote(key, bytes)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
