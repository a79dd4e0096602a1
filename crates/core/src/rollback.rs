// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Records of filesystem mutations a fix made, kept so a failed fix can be undone.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The kind of filesystem mutation a [`RollbackEntry`] can undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollbackKind {
    FileCreate,
    FileModify,
    FileDelete,
    DirCreate,
}

/// Where the prior contents of a mutated file were stashed.
///
/// Small files are kept inline in the journal; anything at or above
/// [`Backup::INLINE_THRESHOLD`] bytes is spilled to a sidecar file next to
/// the original so the in-memory/JSON journal stays cheap to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Backup {
    Inline(Vec<u8>),
    Sidecar(PathBuf),
}

impl Backup {
    pub const INLINE_THRESHOLD: usize = 4096;

    /// Picks [`Backup::Inline`] for small contents, otherwise stages a
    /// [`Backup::Sidecar`] path under `sidecar_dir` (the caller is
    /// responsible for actually writing the bytes there).
    pub fn choose(content: &[u8], sidecar_dir: &std::path::Path, name: &str) -> Self {
        if content.len() < Self::INLINE_THRESHOLD {
            Backup::Inline(content.to_vec())
        } else {
            Backup::Sidecar(sidecar_dir.join(name))
        }
    }
}

/// One reversible step taken while applying a fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackEntry {
    pub kind: RollbackKind,
    pub path: PathBuf,
    pub backup: Option<Backup>,
    pub reversible: bool,
    pub can_rollback: bool,
}

impl RollbackEntry {
    /// A file was created; rolling back means deleting it. Always reversible.
    pub fn file_created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: RollbackKind::FileCreate,
            path: path.into(),
            backup: None,
            reversible: true,
            can_rollback: true,
        }
    }

    /// A file was modified; rolling back restores `backup`.
    pub fn file_modified(path: impl Into<PathBuf>, backup: Backup) -> Self {
        Self {
            kind: RollbackKind::FileModify,
            path: path.into(),
            backup: Some(backup),
            reversible: true,
            can_rollback: true,
        }
    }

    /// A file was deleted; reversible only if its prior contents were captured.
    pub fn file_deleted(path: impl Into<PathBuf>, backup: Option<Backup>) -> Self {
        let reversible = backup.is_some();
        Self {
            kind: RollbackKind::FileDelete,
            path: path.into(),
            backup,
            reversible,
            can_rollback: reversible,
        }
    }

    pub fn dir_created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: RollbackKind::DirCreate,
            path: path.into(),
            backup: None,
            reversible: true,
            can_rollback: true,
        }
    }

    /// Marks this entry as no longer rollback-able, e.g. because a later
    /// step in the same fix already consumed or overwrote it.
    pub fn mark_applied_irreversibly(&mut self) {
        self.can_rollback = false;
    }
}

#[cfg(test)]
#[path = "rollback_tests.rs"]
mod tests;
