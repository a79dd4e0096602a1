// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classification of build failures.

use crate::fix_action::FixAction;
use serde::{Deserialize, Serialize};

/// A class of build failure recognized by substring matching against
/// compiler/linker output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorPatternKind {
    MissingLibrary,
    UndefinedReference,
    MissingHeader,
    MissingFile,
    PermissionDenied,
    CMakeVersion,
    DiskFull,
    SyntaxError,
    Unknown,
}

impl ErrorPatternKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingLibrary => "a required library is not installed",
            Self::UndefinedReference => "the linker could not resolve a symbol",
            Self::MissingHeader => "a required header file is missing",
            Self::MissingFile => "the build referenced a file that does not exist",
            Self::PermissionDenied => "a build step lacked the permissions it needed",
            Self::CMakeVersion => "the project requires a newer CMake than is installed",
            Self::DiskFull => "the build ran out of disk space",
            Self::SyntaxError => "the source failed to parse or compile",
            Self::Unknown => "the failure did not match any known pattern",
        }
    }
}

/// A pattern entry in the matcher's ordered table: the class it
/// recognizes and the priority used to break ties between overlapping
/// matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub kind: ErrorPatternKind,
    pub priority: u8,
}

impl ErrorPattern {
    pub const fn new(kind: ErrorPatternKind, priority: u8) -> Self {
        Self { kind, priority }
    }
}

/// Result of diagnosing a failed `BuildResult` against the pattern table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDiagnosis {
    pub pattern: ErrorPatternKind,
    pub extracted_target: Option<String>,
    pub confidence: f64,
    pub description: String,
    pub planned_fixes: Vec<FixAction>,
}

impl ErrorDiagnosis {
    pub fn new(pattern: ErrorPatternKind, confidence: f64, description: impl Into<String>) -> Self {
        Self {
            pattern,
            extracted_target: None,
            confidence: confidence.clamp(0.0, 1.0),
            description: description.into(),
            planned_fixes: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.extracted_target = Some(target.into());
        self
    }

    pub fn with_fixes(mut self, fixes: Vec<FixAction>) -> Self {
        self.planned_fixes = fixes;
        self
    }
}

#[cfg(test)]
#[path = "error_pattern_tests.rs"]
mod tests;
