// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only project context.
//!
//! Created by the (external) project analyzer and passed immutably to
//! the Recovery Engine and Scheduler. Nothing in this crate mutates it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single dependency declared by the project, and whether it's installed
/// on the current machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,
    pub installed: bool,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>, installed: bool) -> Self {
        Self {
            name: name.into(),
            installed,
        }
    }
}

/// Coarse summary of the project's source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFileSummary {
    pub file_count: usize,
    pub total_bytes: u64,
    pub languages: Vec<String>,
}

/// Immutable description of a source project: root, language, build
/// system, dependencies, and a coarse source-file summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub language: String,
    pub build_system: String,
    pub dependencies: Vec<DependencySpec>,
    pub source_summary: SourceFileSummary,
}

impl ProjectContext {
    pub fn new(
        root: impl Into<PathBuf>,
        language: impl Into<String>,
        build_system: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            language: language.into(),
            build_system: build_system.into(),
            dependencies: Vec::new(),
            source_summary: SourceFileSummary::default(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<DependencySpec>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_source_summary(mut self, summary: SourceFileSummary) -> Self {
        self.source_summary = summary;
        self
    }

    /// Look up a declared dependency by name.
    pub fn dependency(&self, name: &str) -> Option<&DependencySpec> {
        self.dependencies.iter().find(|d| d.name == name)
    }

    pub fn is_dependency_installed(&self, name: &str) -> bool {
        self.dependency(name).map(|d| d.installed).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
