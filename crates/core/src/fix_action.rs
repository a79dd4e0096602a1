// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic, reversible-when-possible changes the recovery engine can apply.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a planned fix came from: the deterministic planner, the
/// fix-history learner, or the (external) LLM oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixSource {
    Planner,
    History,
    Llm,
}

/// The operation a `FixAction` represents. Kept separate from `FixAction`
/// so attributes (`description`, `requires_confirmation`, `source`) don't
/// have to be duplicated across match arms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FixKind {
    InstallPackage { name: String },
    CreateFile { path: PathBuf, content: String },
    ModifyFile { path: PathBuf, patch: String },
    DeleteFile { path: PathBuf },
    RunCommand { cmd: String },
    FixCMakeVersion { path: PathBuf, new_version: String },
    SetEnvVar { key: String, value: String },
    CleanBuild { dir: PathBuf },
    Retry,
    Noop,
}

impl FixKind {
    /// Short machine-stable tag, used as part of fix-history keys.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::InstallPackage { .. } => "install_package",
            Self::CreateFile { .. } => "create_file",
            Self::ModifyFile { .. } => "modify_file",
            Self::DeleteFile { .. } => "delete_file",
            Self::RunCommand { .. } => "run_command",
            Self::FixCMakeVersion { .. } => "fix_cmake_version",
            Self::SetEnvVar { .. } => "set_env_var",
            Self::CleanBuild { .. } => "clean_build",
            Self::Retry => "retry",
            Self::Noop => "noop",
        }
    }
}

/// An action the recovery engine can apply, with its provenance and
/// whether a human must confirm before it's applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixAction {
    pub kind: FixKind,
    pub description: String,
    pub requires_confirmation: bool,
    pub source: FixSource,
}

impl FixAction {
    pub fn new(kind: FixKind, description: impl Into<String>, source: FixSource) -> Self {
        let requires_confirmation = matches!(kind, FixKind::InstallPackage { .. } | FixKind::RunCommand { .. } | FixKind::DeleteFile { .. });
        Self {
            kind,
            description: description.into(),
            requires_confirmation,
            source,
        }
    }

    pub fn requiring_confirmation(mut self, requires: bool) -> Self {
        self.requires_confirmation = requires;
        self
    }

    pub fn install_package(name: impl Into<String>, source: FixSource) -> Self {
        let name = name.into();
        let description = format!("install package '{}'", name);
        Self::new(FixKind::InstallPackage { name }, description, source)
    }

    pub fn clean_build(dir: impl Into<PathBuf>, source: FixSource) -> Self {
        let dir = dir.into();
        let description = format!("clean build directory {}", dir.display());
        Self::new(FixKind::CleanBuild { dir }, description, source)
    }

    pub fn retry() -> Self {
        Self::new(FixKind::Retry, "retry the build", FixSource::Planner).requiring_confirmation(false)
    }

    pub fn noop() -> Self {
        Self::new(FixKind::Noop, "no action", FixSource::Planner).requiring_confirmation(false)
    }

    pub fn fix_cmake_version(
        path: impl Into<PathBuf>,
        new_version: impl Into<String>,
        source: FixSource,
    ) -> Self {
        let path = path.into();
        let new_version = new_version.into();
        let description = format!(
            "bump cmake_minimum_required in {} to {}",
            path.display(),
            new_version
        );
        Self::new(
            FixKind::FixCMakeVersion { path, new_version },
            description,
            source,
        )
    }

    pub fn run_command(cmd: impl Into<String>, source: FixSource) -> Self {
        let cmd = cmd.into();
        let description = format!("run `{}`", cmd);
        Self::new(FixKind::RunCommand { cmd }, description, source)
    }

    pub fn create_file(path: impl Into<PathBuf>, content: impl Into<String>, source: FixSource) -> Self {
        let path = path.into();
        let description = format!("create {}", path.display());
        Self::new(
            FixKind::CreateFile {
                path,
                content: content.into(),
            },
            description,
            source,
        )
    }
}

#[cfg(test)]
#[path = "fix_action_tests.rs"]
mod tests;
