// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of invoking a project's native build tool.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;

/// Immutable once produced by the Build Executor; consumed by the Error
/// Pattern Matcher and the Recovery Engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration_sec: f64,
    pub artifacts: Vec<PathBuf>,
}

impl BuildResult {
    pub fn success(duration_sec: f64, artifacts: Vec<PathBuf>) -> Self {
        Self {
            success: true,
            exit_code: 0,
            stdout: Vec::new(),
            stderr: Vec::new(),
            duration_sec,
            artifacts,
        }
    }

    pub fn failure(exit_code: i32, stdout: Vec<u8>, stderr: Vec<u8>, duration_sec: f64) -> Self {
        Self {
            success: false,
            exit_code,
            stdout,
            stderr,
            duration_sec,
            artifacts: Vec::new(),
        }
    }

    /// Lossy UTF-8 view of stdout, for text-oriented matching.
    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Lossy UTF-8 view of stderr, for text-oriented matching.
    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

#[cfg(test)]
#[path = "build_result_tests.rs"]
mod tests;
