// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scores how risky a fix is to apply automatically.

use boe_core::fix_action::{FixAction, FixKind};
use std::path::{Path, PathBuf};

/// Risk tier a fix falls into, from "no effect" to "matches a
/// destructive-command pattern". Ordered so a policy ceiling can be
/// compared with `<=`/`>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// Full risk picture for one fix: the level plus enough context for a
/// human-facing confirmation prompt or an audit log line.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub description: String,
    pub is_reversible: bool,
    pub requires_backup: bool,
    pub requires_confirmation: bool,
    pub affected_files: Vec<PathBuf>,
}

/// Substrings that bump a `RunCommand` from `Medium` to `Critical`,
/// regardless of what else the command does.
const CRITICAL_NEEDLES: &[&str] = &["sudo", "rm -rf", "chmod", "chown"];

/// Assesses the risk of applying a fix without human review. Deliberately
/// independent of [`FixAction::requires_confirmation`]: that flag is the
/// fix's own declared default, while `RiskAssessor` re-derives a level
/// from the operation's shape so a caller can apply a uniform policy
/// (e.g. "refuse anything above `Medium` unless `--auto-apply` was
/// passed") regardless of how each fix was constructed.
pub struct RiskAssessor;

impl RiskAssessor {
    pub fn assess(fix: &FixAction) -> RiskAssessment {
        match &fix.kind {
            FixKind::Noop | FixKind::Retry => RiskAssessment {
                level: RiskLevel::None,
                description: "no filesystem or process effect".to_string(),
                is_reversible: true,
                requires_backup: false,
                requires_confirmation: false,
                affected_files: Vec::new(),
            },
            FixKind::SetEnvVar { key, .. } => RiskAssessment {
                level: RiskLevel::Low,
                description: format!("sets the process-local environment variable '{key}'"),
                is_reversible: true,
                requires_backup: false,
                requires_confirmation: false,
                affected_files: Vec::new(),
            },
            FixKind::CleanBuild { dir } => RiskAssessment {
                level: RiskLevel::Low,
                description: "deletes a build output directory".to_string(),
                is_reversible: false,
                requires_backup: false,
                requires_confirmation: false,
                affected_files: vec![dir.clone()],
            },
            FixKind::ModifyFile { path, .. } => medium(path, "modifies a file in place"),
            FixKind::FixCMakeVersion { path, .. } => medium(path, "rewrites the project's CMake version directive"),
            FixKind::CreateFile { path, .. } => medium(path, "creates a new file"),
            FixKind::DeleteFile { path } => RiskAssessment {
                level: RiskLevel::High,
                description: "deletes a file".to_string(),
                is_reversible: false,
                requires_backup: true,
                requires_confirmation: true,
                affected_files: vec![path.clone()],
            },
            FixKind::InstallPackage { name } => RiskAssessment {
                level: RiskLevel::High,
                description: format!("installs the '{name}' package via the system package manager"),
                is_reversible: false,
                requires_backup: false,
                requires_confirmation: true,
                affected_files: Vec::new(),
            },
            FixKind::RunCommand { cmd } => {
                if CRITICAL_NEEDLES.iter().any(|needle| cmd.contains(needle)) {
                    RiskAssessment {
                        level: RiskLevel::Critical,
                        description: format!("runs `{cmd}`, which matches a destructive-command pattern"),
                        is_reversible: false,
                        requires_backup: false,
                        requires_confirmation: true,
                        affected_files: Vec::new(),
                    }
                } else {
                    RiskAssessment {
                        level: RiskLevel::Medium,
                        description: format!("runs an arbitrary command: `{cmd}`"),
                        is_reversible: false,
                        requires_backup: false,
                        requires_confirmation: true,
                        affected_files: Vec::new(),
                    }
                }
            }
        }
    }

    /// Whether `fix` may be applied without an explicit `--auto-apply`
    /// opt-in, given the caller's maximum acceptable risk.
    pub fn is_within_policy(fix: &FixAction, max_allowed: RiskLevel) -> bool {
        Self::assess(fix).level <= max_allowed
    }
}

fn medium(path: &Path, description: &str) -> RiskAssessment {
    RiskAssessment {
        level: RiskLevel::Medium,
        description: description.to_string(),
        is_reversible: true,
        requires_backup: true,
        requires_confirmation: false,
        affected_files: vec![path.to_path_buf()],
    }
}

#[cfg(test)]
#[path = "risk_tests.rs"]
mod tests;
