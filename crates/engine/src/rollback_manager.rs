// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applies and reverses the filesystem side of a fix, using sidecar
//! backups for anything too large to keep inline.

use boe_core::rollback::{Backup, RollbackEntry, RollbackKind};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Journals filesystem mutations so a fix that makes things worse can be
/// undone. Large backups spill to `sidecar_dir` rather than living in the
/// in-memory/JSON journal, following the same tombstone-style separation
/// of "journal entry" from "bulk backup bytes" used elsewhere in this
/// codebase for reversible destructive operations.
pub struct RollbackManager {
    sidecar_dir: PathBuf,
}

impl RollbackManager {
    pub fn new(sidecar_dir: impl Into<PathBuf>) -> Self {
        Self { sidecar_dir: sidecar_dir.into() }
    }

    /// Captures `path`'s current contents before it's overwritten.
    pub async fn record_before_modify(&self, path: &Path) -> std::io::Result<RollbackEntry> {
        let content = tokio::fs::read(path).await?;
        let backup = self.stash(&content, path).await?;
        Ok(RollbackEntry::file_modified(path, backup))
    }

    /// Captures `path`'s current contents before it's deleted. Returns an
    /// entry with no backup (and thus not reversible) if the file is
    /// already gone -- there's nothing to capture.
    pub async fn record_before_delete(&self, path: &Path) -> std::io::Result<RollbackEntry> {
        match tokio::fs::read(path).await {
            Ok(content) => {
                let backup = self.stash(&content, path).await?;
                Ok(RollbackEntry::file_deleted(path, Some(backup)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(RollbackEntry::file_deleted(path, None))
            }
            Err(e) => Err(e),
        }
    }

    pub fn record_create(&self, path: &Path) -> RollbackEntry {
        RollbackEntry::file_created(path)
    }

    /// Restores the filesystem to the state `entry` captured. A no-op for
    /// entries created by [`Self::record_create`] of a directory, or for
    /// any entry with `can_rollback == false`.
    pub async fn rollback(&self, entry: &RollbackEntry) -> std::io::Result<()> {
        if !entry.can_rollback {
            return Ok(());
        }
        match &entry.backup {
            Some(Backup::Inline(bytes)) => tokio::fs::write(&entry.path, bytes).await,
            Some(Backup::Sidecar(sidecar_path)) => {
                let bytes = tokio::fs::read(sidecar_path).await?;
                tokio::fs::write(&entry.path, bytes).await
            }
            None => {
                // FileCreate/DirCreate: undo by removing what was created.
                if entry.path.is_dir() {
                    tokio::fs::remove_dir_all(&entry.path).await
                } else if entry.path.exists() {
                    tokio::fs::remove_file(&entry.path).await
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn stash(&self, content: &[u8], original: &Path) -> std::io::Result<Backup> {
        let name = original.file_name().and_then(|n| n.to_str()).unwrap_or("backup");
        let sidecar_name = format!("{name}.bak");
        match Backup::choose(content, &self.sidecar_dir, &sidecar_name) {
            Backup::Inline(bytes) => Ok(Backup::Inline(bytes)),
            Backup::Sidecar(sidecar_path) => {
                tokio::fs::create_dir_all(&self.sidecar_dir).await?;
                tokio::fs::write(&sidecar_path, content).await?;
                Ok(Backup::Sidecar(sidecar_path))
            }
        }
    }
}

struct LoggedEntry {
    entry: RollbackEntry,
    logged_at_unix_ms: i64,
}

/// Append-only journal of rollback steps taken during one process lifetime.
/// [`RollbackManager`] does the filesystem-level backup/restore work;
/// this adds the ordered log, `rollback_last`, and retention-based cleanup.
/// Entries persist across a process only if the host explicitly persists
/// them -- this log is in-memory for the lifetime of the `RollbackLog`
/// value.
pub struct RollbackLog {
    manager: RollbackManager,
    entries: Mutex<Vec<LoggedEntry>>,
}

impl RollbackLog {
    pub fn new(sidecar_dir: impl Into<PathBuf>) -> Self {
        Self { manager: RollbackManager::new(sidecar_dir), entries: Mutex::new(Vec::new()) }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshots `path` per `kind` and appends the resulting entry to the
    /// log. Returns the entry's index, for later `rollback(index)`.
    pub async fn backup_file(&self, path: &Path, kind: RollbackKind, now_unix_ms: i64) -> std::io::Result<usize> {
        let entry = match kind {
            RollbackKind::FileModify => self.manager.record_before_modify(path).await?,
            RollbackKind::FileDelete => self.manager.record_before_delete(path).await?,
            RollbackKind::FileCreate => self.manager.record_create(path),
            RollbackKind::DirCreate => RollbackEntry::dir_created(path),
        };
        let mut entries = self.entries.lock();
        entries.push(LoggedEntry { entry, logged_at_unix_ms: now_unix_ms });
        Ok(entries.len() - 1)
    }

    /// Reverses the entry at `index`. `can_rollback` flips to `false`
    /// after any attempt -- successful or not -- so a repeated call is a
    /// no-op.
    pub async fn rollback(&self, index: usize) -> std::io::Result<()> {
        let entry = {
            let entries = self.entries.lock();
            match entries.get(index) {
                Some(logged) if logged.entry.can_rollback => logged.entry.clone(),
                _ => return Ok(()),
            }
        };
        let result = self.manager.rollback(&entry).await;
        if let Some(logged) = self.entries.lock().get_mut(index) {
            logged.entry.mark_applied_irreversibly();
        }
        result
    }

    /// Walks the log newest-first, reversing up to `n` entries.
    pub async fn rollback_last(&self, n: usize) -> std::io::Result<()> {
        let indices: Vec<usize> = {
            let entries = self.entries.lock();
            (0..entries.len()).rev().take(n).collect()
        };
        for index in indices {
            self.rollback(index).await?;
        }
        Ok(())
    }

    /// Drops entries older than `retention_ms` and deletes their sidecar
    /// files. Returns the number of entries dropped.
    pub async fn cleanup(&self, now_unix_ms: i64, retention_ms: i64) -> std::io::Result<usize> {
        let stale: Vec<LoggedEntry> = {
            let mut entries = self.entries.lock();
            let (stale, fresh): (Vec<_>, Vec<_>) =
                entries.drain(..).partition(|logged| now_unix_ms - logged.logged_at_unix_ms > retention_ms);
            *entries = fresh;
            stale
        };
        for logged in &stale {
            if let Some(Backup::Sidecar(path)) = &logged.entry.backup {
                let _ = tokio::fs::remove_file(path).await;
            }
        }
        Ok(stale.len())
    }
}

#[cfg(test)]
#[path = "rollback_manager_tests.rs"]
mod tests;
