// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent fix-history learner: a JSON document of
//! [`FixHistoryEntry`] rows, indexed in memory by `(error_signature,
//! fix_tag)`, that the recovery engine consults to prefer fixes with a
//! good track record over the planner's default ordering.

use boe_core::error_pattern::{ErrorDiagnosis, ErrorPatternKind};
use boe_core::fix_action::{FixAction, FixKind, FixSource};
use boe_core::fix_history::FixHistoryEntry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixHistoryError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed history document: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type FixHistoryResult<T> = Result<T, FixHistoryError>;

/// On-disk shape: `{"entries": [...]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryDocument {
    entries: Vec<FixHistoryEntry>,
}

/// Minimum score for [`FixHistory::suggest`] to propose a historical fix
/// rather than deferring to the planner's deterministic ordering.
pub const SUGGESTION_THRESHOLD: f64 = 0.5;

/// Caps the number of entries the store retains; once full, the
/// lowest-scored entry is evicted to make room for a new one.
const DEFAULT_CAP: usize = 1000;

fn normalize_message(message: &str) -> String {
    message
        .split_whitespace()
        .take(12)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Builds the `"<pattern>:<normalized message>"` error signature two
/// diagnoses are considered the same fix-history bucket under.
pub fn error_signature(pattern: ErrorPatternKind, message: &str) -> String {
    format!("{pattern:?}:{}", normalize_message(message))
}

struct Inner {
    entries: HashMap<(String, String), FixHistoryEntry>,
    cap: usize,
}

/// Thread-safe, file-backed fix history. `load`/`save` round-trip the
/// full entry set field-for-field.
pub struct FixHistory {
    path: PathBuf,
    inner: Mutex<Inner>,
}

/// Object-safe view the recovery engine depends on, so it can be injected
/// without naming the concrete file-backed type (and so tests can
/// substitute a throwaway in-memory store).
pub trait FixHistoryStore: Send + Sync {
    fn record_success(&self, signature: &str, pattern: ErrorPatternKind, fix_kind: &FixKind, duration_ms: f64, now_unix_ms: i64);
    fn record_failure(&self, signature: &str, pattern: ErrorPatternKind, fix_kind: &FixKind, duration_ms: f64, now_unix_ms: i64);
    fn suggest(&self, diagnosis: &ErrorDiagnosis, now_unix_ms: i64) -> Option<FixAction>;
}

impl FixHistory {
    /// Loads from `path` if it exists, otherwise starts empty -- a
    /// missing history file is not an error, just an untrained one.
    pub fn load(path: impl Into<PathBuf>) -> FixHistoryResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let bytes = std::fs::read(&path)?;
            let doc: HistoryDocument = serde_json::from_slice(&bytes)?;
            doc.entries
                .into_iter()
                .map(|e| ((e.error_signature.clone(), e.fix_tag.clone()), e))
                .collect()
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            inner: Mutex::new(Inner { entries, cap: DEFAULT_CAP }),
        })
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.inner.lock().cap = cap;
        self
    }

    /// Writes the full entry set back to disk as `{"entries": [...]}`.
    pub fn save(&self) -> FixHistoryResult<()> {
        let entries: Vec<FixHistoryEntry> = self.inner.lock().entries.values().cloned().collect();
        let doc = HistoryDocument { entries };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries matching `pattern`, deep-cloned so callers can't
    /// mutate the store's internal state through the returned values.
    pub fn entries_for_pattern(&self, pattern: ErrorPatternKind) -> Vec<FixHistoryEntry> {
        self.inner
            .lock()
            .entries
            .values()
            .filter(|e| e.pattern == pattern)
            .cloned()
            .collect()
    }

    fn record_outcome(
        &self,
        signature: &str,
        pattern: ErrorPatternKind,
        fix_kind: &FixKind,
        success: bool,
        duration_ms: f64,
        now_unix_ms: i64,
    ) {
        let mut inner = self.inner.lock();
        let key = (signature.to_string(), fix_kind.tag().to_string());
        if let Some(entry) = inner.entries.get_mut(&key) {
            if success {
                entry.record_success(duration_ms, now_unix_ms);
            } else {
                entry.record_failure(duration_ms, now_unix_ms);
            }
            return;
        }

        if inner.entries.len() >= inner.cap {
            if let Some(worst_key) = inner
                .entries
                .iter()
                .min_by(|a, b| {
                    a.1.suggestion_score(now_unix_ms)
                        .partial_cmp(&b.1.suggestion_score(now_unix_ms))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(k, _)| k.clone())
            {
                inner.entries.remove(&worst_key);
            }
        }

        let mut entry = FixHistoryEntry::new(signature, pattern, fix_kind, now_unix_ms);
        if success {
            entry.record_success(duration_ms, now_unix_ms);
        } else {
            entry.record_failure(duration_ms, now_unix_ms);
        }
        inner.entries.insert(key, entry);
    }

    pub fn record_success(&self, signature: &str, pattern: ErrorPatternKind, fix_kind: &FixKind, duration_ms: f64, now_unix_ms: i64) {
        self.record_outcome(signature, pattern, fix_kind, true, duration_ms, now_unix_ms);
    }

    pub fn record_failure(&self, signature: &str, pattern: ErrorPatternKind, fix_kind: &FixKind, duration_ms: f64, now_unix_ms: i64) {
        self.record_outcome(signature, pattern, fix_kind, false, duration_ms, now_unix_ms);
    }

    /// Best historically-successful fix for `diagnosis`, if any entry's
    /// `suggestion_score` clears [`SUGGESTION_THRESHOLD`]. Returned
    /// actions are always marked `requires_confirmation = true` with
    /// `source = History`.
    pub fn suggest(&self, diagnosis: &ErrorDiagnosis, now_unix_ms: i64) -> Option<FixAction> {
        let candidates = self.entries_for_pattern(diagnosis.pattern);
        let best = candidates
            .iter()
            .max_by(|a, b| {
                a.suggestion_score(now_unix_ms)
                    .partial_cmp(&b.suggestion_score(now_unix_ms))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
        if best.suggestion_score(now_unix_ms) < SUGGESTION_THRESHOLD {
            return None;
        }
        let description = format!(
            "historically successful fix for {:?} ({}/{} prior attempts succeeded)",
            best.pattern,
            best.success_count,
            best.total_attempts()
        );
        let kind = fix_kind_from_tag(best, &best.fix_tag);
        Some(FixAction::new(kind, description, FixSource::History).requiring_confirmation(true))
    }
}

impl FixHistoryStore for FixHistory {
    fn record_success(&self, signature: &str, pattern: ErrorPatternKind, fix_kind: &FixKind, duration_ms: f64, now_unix_ms: i64) {
        FixHistory::record_success(self, signature, pattern, fix_kind, duration_ms, now_unix_ms);
    }

    fn record_failure(&self, signature: &str, pattern: ErrorPatternKind, fix_kind: &FixKind, duration_ms: f64, now_unix_ms: i64) {
        FixHistory::record_failure(self, signature, pattern, fix_kind, duration_ms, now_unix_ms);
    }

    fn suggest(&self, diagnosis: &ErrorDiagnosis, now_unix_ms: i64) -> Option<FixAction> {
        FixHistory::suggest(self, diagnosis, now_unix_ms)
    }
}

/// Reconstructs an approximate [`FixKind`] from a stored tag plus
/// whatever target the entry recorded, for re-proposing a historical fix.
/// Falls back to [`FixKind::Retry`] for tags with no reconstructable shape.
fn fix_kind_from_tag(entry: &FixHistoryEntry, tag: &str) -> FixKind {
    let target = entry.fix_target.clone().unwrap_or_default();
    match tag {
        "install_package" => FixKind::InstallPackage { name: target },
        "run_command" => FixKind::RunCommand {
            cmd: entry.fix_command.clone().unwrap_or(target),
        },
        "fix_cmake_version" => FixKind::FixCMakeVersion {
            path: PathBuf::from("CMakeLists.txt"),
            new_version: target,
        },
        "clean_build" => FixKind::CleanBuild { dir: PathBuf::from(if target.is_empty() { "build".into() } else { target }) },
        "set_env_var" => FixKind::SetEnvVar { key: target, value: String::new() },
        _ => FixKind::Retry,
    }
}

#[cfg(test)]
#[path = "fix_history_tests.rs"]
mod tests;
