// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Learned track record of which fixes worked for which error patterns.

use crate::error_pattern::ErrorPatternKind;
use crate::fix_action::FixKind;
use serde::{Deserialize, Serialize};

/// A fix's track record against one [`ErrorPatternKind`], keyed externally
/// by `(error_signature, fix_tag)` in the history store.
///
/// `error_signature` is `"<pattern>:<normalized error message>"` so that
/// the same pattern plus a similar message collapses onto one entry
/// rather than growing one row per slightly-different compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixHistoryEntry {
    pub error_signature: String,
    pub pattern: ErrorPatternKind,
    pub fix_tag: String,
    pub fix_command: Option<String>,
    pub fix_target: Option<String>,
    pub project_type: Option<String>,
    pub build_system: Option<String>,
    pub success_count: u32,
    pub failure_count: u32,
    pub first_seen_unix_ms: i64,
    pub last_seen_unix_ms: i64,
    pub avg_fix_time_ms: f64,
}

impl FixHistoryEntry {
    pub fn new(
        error_signature: impl Into<String>,
        pattern: ErrorPatternKind,
        fix_kind: &FixKind,
        now_unix_ms: i64,
    ) -> Self {
        Self {
            error_signature: error_signature.into(),
            pattern,
            fix_tag: fix_kind.tag().to_string(),
            fix_command: None,
            fix_target: None,
            project_type: None,
            build_system: None,
            success_count: 0,
            failure_count: 0,
            first_seen_unix_ms: now_unix_ms,
            last_seen_unix_ms: now_unix_ms,
            avg_fix_time_ms: 0.0,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.fix_target = Some(target.into());
        self
    }

    pub fn with_project(mut self, project_type: impl Into<String>, build_system: impl Into<String>) -> Self {
        self.project_type = Some(project_type.into());
        self.build_system = Some(build_system.into());
        self
    }

    pub fn total_attempts(&self) -> u32 {
        self.success_count + self.failure_count
    }

    /// Wilson-free empirical success rate; a fresh entry scores 0.0 so
    /// untried fixes never outrank fixes with a positive track record.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_attempts();
        if total == 0 {
            0.0
        } else {
            f64::from(self.success_count) / f64::from(total)
        }
    }

    /// Ranking score used by the fix planner to prefer fixes that are both
    /// reliable and fast. Untried fixes score 0.0, letting the planner fall
    /// back to its deterministic rules.
    pub fn score(&self) -> f64 {
        if self.total_attempts() == 0 {
            return 0.0;
        }
        let speed_bonus = 1.0 / (1.0 + self.avg_fix_time_ms / 1000.0);
        self.success_rate() * 0.8 + speed_bonus * 0.2
    }

    pub fn record_success(&mut self, duration_ms: f64, now_unix_ms: i64) {
        let total_before = self.total_attempts();
        self.avg_fix_time_ms = running_average(self.avg_fix_time_ms, total_before, duration_ms);
        self.success_count += 1;
        self.last_seen_unix_ms = self.last_seen_unix_ms.max(now_unix_ms);
    }

    pub fn record_failure(&mut self, duration_ms: f64, now_unix_ms: i64) {
        let total_before = self.total_attempts();
        self.avg_fix_time_ms = running_average(self.avg_fix_time_ms, total_before, duration_ms);
        self.failure_count += 1;
        self.last_seen_unix_ms = self.last_seen_unix_ms.max(now_unix_ms);
    }

    /// Recency component of the history-learner's ranking score:
    /// `1 / (1 + days_since_last_seen)`.
    pub fn recency_score(&self, now_unix_ms: i64) -> f64 {
        let days_since = ((now_unix_ms - self.last_seen_unix_ms).max(0) as f64) / 86_400_000.0;
        1.0 / (1.0 + days_since)
    }

    /// Combined ranking score `suggest()` uses to pick a historically
    /// successful fix: `0.7 * success_rate + 0.3 * recency_score`.
    pub fn suggestion_score(&self, now_unix_ms: i64) -> f64 {
        if self.total_attempts() == 0 {
            return 0.0;
        }
        0.7 * self.success_rate() + 0.3 * self.recency_score(now_unix_ms)
    }
}

fn running_average(current_avg: f64, count_so_far: u32, new_value: f64) -> f64 {
    let count = f64::from(count_so_far);
    (current_avg * count + new_value) / (count + 1.0)
}

#[cfg(test)]
#[path = "fix_history_tests.rs"]
mod tests;
