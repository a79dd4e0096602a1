// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sanity-checks a planned fix before it's applied.

use boe_core::fix_action::{FixAction, FixKind};
use boe_core::project::ProjectContext;

/// Outcome bucket of validating a fix against the current project state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Passed,
    Warning,
    Failed,
    Skipped,
}

/// Full validation outcome: the bucket plus whether the caller should go
/// ahead and apply the fix anyway (a `Warning` still proceeds, just with
/// reduced confidence; `Failed`/`Skipped` do not).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub can_proceed: bool,
    pub confidence: f64,
    pub message: String,
}

impl ValidationResult {
    fn passed(message: impl Into<String>) -> Self {
        Self { status: ValidationStatus::Passed, can_proceed: true, confidence: 1.0, message: message.into() }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self { status: ValidationStatus::Warning, can_proceed: true, confidence: 0.5, message: message.into() }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self { status: ValidationStatus::Failed, can_proceed: false, confidence: 0.0, message: message.into() }
    }
}

/// Checks a [`FixAction`] is plausible to apply given `project`'s current
/// state, without actually applying it. A fix can be well-formed (valid
/// per [`FixAction::new`]'s invariants) yet still fail validation -- e.g.
/// deleting a file that's already gone.
pub struct Validator;

impl Validator {
    pub fn validate(fix: &FixAction, project: &ProjectContext) -> ValidationResult {
        match &fix.kind {
            FixKind::InstallPackage { name } => {
                let well_formed = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
                if well_formed && boe_adapters::default_package_manager().is_some() {
                    ValidationResult::passed("package name is well-formed and a package manager is available")
                } else if !well_formed {
                    ValidationResult::warning(format!("'{name}' is not a plausible package name"))
                } else {
                    ValidationResult::warning("no supported package manager was found on PATH")
                }
            }
            FixKind::CreateFile { path, .. } | FixKind::ModifyFile { path, .. } => {
                let target = resolve(project, path);
                match target.parent() {
                    Some(parent) if parent.as_os_str().is_empty() || parent.is_dir() => {
                        ValidationResult::passed("parent directory is resolvable")
                    }
                    _ => ValidationResult::failed(format!("parent directory of {} is not accessible", target.display())),
                }
            }
            FixKind::DeleteFile { path } => {
                let target = resolve(project, path);
                if target.exists() {
                    ValidationResult::passed("target file exists")
                } else {
                    ValidationResult::failed(format!("{} does not exist", target.display()))
                }
            }
            FixKind::RunCommand { cmd } => {
                let first_token = cmd.trim().strip_prefix("sudo").map(str::trim_start).unwrap_or(cmd.trim()).split_whitespace().next();
                match first_token {
                    Some(token) if boe_adapters::which(token).is_some() => ValidationResult::passed(format!("'{token}' resolves on PATH")),
                    Some(token) => ValidationResult::warning(format!("'{token}' does not resolve on PATH")),
                    None => ValidationResult::warning("command is empty"),
                }
            }
            FixKind::FixCMakeVersion { path, .. } => {
                let target = resolve(project, path);
                if target.exists() {
                    ValidationResult::passed("target CMake file exists")
                } else {
                    ValidationResult::failed(format!("{} does not exist", target.display()))
                }
            }
            // Reversible informational actions: no filesystem precondition to check.
            FixKind::Retry | FixKind::Noop | FixKind::SetEnvVar { .. } | FixKind::CleanBuild { .. } => {
                ValidationResult::passed("reversible, no precondition to check")
            }
        }
    }
}

fn resolve(project: &ProjectContext, path: &std::path::Path) -> std::path::PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project.root.join(path)
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
