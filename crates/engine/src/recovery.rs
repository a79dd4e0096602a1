// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The retry loop that ties the whole local-recovery pipeline together:
//! build, diagnose, plan, validate, assess risk, back up, apply, learn,
//! retry.

use crate::risk::{RiskAssessor, RiskLevel};
use crate::rollback_manager::RollbackManager;
use crate::validator::Validator;
use crate::{error_matcher::ErrorMatcher, fix_planner::FixPlanner};
use async_trait::async_trait;
use boe_core::error_pattern::ErrorDiagnosis;
use boe_core::fix_action::{FixAction, FixKind, FixSource};
use boe_core::project::ProjectContext;
use boe_core::BuildResult;
use boe_storage::fix_history::{error_signature, FixHistoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Runs the project's native build tool. Implemented in production by a
/// thin wrapper over [`boe_adapters::execute_build`]; swappable in tests
/// for a scripted sequence of outcomes.
#[async_trait]
pub trait BuildRunner: Send + Sync {
    async fn run_build(&self, project: &ProjectContext) -> BuildResult;
}

/// Applies a single [`FixAction`] to the filesystem or toolchain. The
/// default impl lives alongside this module; callers needing a
/// dry-run or sandboxed variant implement their own.
#[async_trait]
pub trait ActionApplier: Send + Sync {
    async fn apply(&self, action: &FixAction, project: &ProjectContext) -> Result<(), String>;
}

/// Black-box `Diagnose(error) -> suggested fix` oracle, standing in for
/// an external LLM gateway. Consulted only when `use_ai_analysis` is set
/// and the pattern matcher's confidence falls below
/// [`RecoveryStrategy::confidence_threshold`].
pub trait DiagnoseOracle: Send + Sync {
    fn diagnose(&self, result: &BuildResult) -> Option<ErrorDiagnosis>;
}

#[derive(Debug, Clone)]
pub struct RecoveryStrategy {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
    pub auto_apply_fixes: bool,
    pub use_ai_analysis: bool,
    /// Risk ceiling applied when `auto_apply_fixes` is false; anything
    /// riskier than this halts the loop and reports rather than applying.
    pub max_auto_risk: RiskLevel,
    pub confidence_threshold: f64,
}

impl Default for RecoveryStrategy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay_ms: 1_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 60_000,
            auto_apply_fixes: false,
            use_ai_analysis: false,
            max_auto_risk: RiskLevel::Low,
            confidence_threshold: 0.5,
        }
    }
}

impl RecoveryStrategy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.retry_delay_ms as f64 * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis(base.min(self.max_delay_ms as f64) as u64)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RecoveryStats {
    pub total_attempts: u32,
    pub successful_recoveries: u32,
}

#[derive(Debug, Clone)]
pub enum RecoveryOutcome {
    /// The build succeeded, possibly after one or more fixes were applied.
    Success { result: BuildResult, stats: RecoveryStats },
    /// `max_retries` attempts were made without a successful build.
    Exhausted { last_result: BuildResult, stats: RecoveryStats, summary: String },
    /// A fix exceeded `max_auto_risk` with `auto_apply_fixes=false`; the
    /// loop stopped rather than guess.
    PolicyRefusal {
        diagnosis: ErrorDiagnosis,
        action: FixAction,
        risk: RiskLevel,
        stats: RecoveryStats,
    },
}

pub struct RecoveryEngine<B: BuildRunner, A: ActionApplier> {
    builder: B,
    applier: A,
    history: Arc<dyn FixHistoryStore>,
    rollback: RollbackManager,
    matcher: ErrorMatcher,
    oracle: Option<Arc<dyn DiagnoseOracle>>,
    strategy: RecoveryStrategy,
}

impl<B: BuildRunner, A: ActionApplier> RecoveryEngine<B, A> {
    pub fn new(
        builder: B,
        applier: A,
        history: Arc<dyn FixHistoryStore>,
        rollback: RollbackManager,
        strategy: RecoveryStrategy,
    ) -> Self {
        Self {
            builder,
            applier,
            history,
            rollback,
            matcher: ErrorMatcher::with_default_rules(),
            oracle: None,
            strategy,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn DiagnoseOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Runs the full retry loop against `project`. `now_ms` supplies the
    /// wall-clock time at loop start and is advanced by the caller-visible
    /// effect of `tokio::time::sleep` between attempts; fix-history
    /// bookkeeping uses it directly rather than re-reading the system
    /// clock, so tests can drive it deterministically with a fake clock
    /// source.
    pub async fn recover(&self, project: &ProjectContext, mut now_ms: i64) -> RecoveryOutcome {
        let mut stats = RecoveryStats::default();

        for attempt in 1..=self.strategy.max_retries {
            stats.total_attempts += 1;
            let span = tracing::info_span!("recovery_attempt", attempt);
            let result = self.builder.run_build(project).instrument(span).await;
            if result.success {
                return RecoveryOutcome::Success { result, stats };
            }

            let diagnosis = self.diagnose(&result);
            let plan = self.build_plan(&diagnosis, now_ms);

            match self.try_plan(&plan, &diagnosis, project, now_ms).await {
                PlanOutcome::Recovered => {
                    stats.successful_recoveries += 1;
                }
                PlanOutcome::Exhausted => {}
                PlanOutcome::Refused { action, risk } => {
                    return RecoveryOutcome::PolicyRefusal { diagnosis, action, risk, stats };
                }
            }

            if attempt == self.strategy.max_retries {
                let summary = format!(
                    "exhausted {} attempts; last failure: {}",
                    self.strategy.max_retries, diagnosis.description
                );
                return RecoveryOutcome::Exhausted { last_result: result, stats, summary };
            }

            let delay = self.strategy.delay_for_attempt(attempt);
            tokio::time::sleep(delay).await;
            now_ms += delay.as_millis() as i64;
        }

        unreachable!("loop always returns by its last iteration")
    }

    fn diagnose(&self, result: &BuildResult) -> ErrorDiagnosis {
        let diagnosis = self.matcher.diagnose(result);
        if self.strategy.use_ai_analysis && diagnosis.confidence < self.strategy.confidence_threshold {
            if let Some(oracle) = &self.oracle {
                if let Some(oracle_diagnosis) = oracle.diagnose(result) {
                    return oracle_diagnosis;
                }
            }
        }
        diagnosis
    }

    /// Planner output, with a history-learned suggestion prepended when
    /// it clears the suggestion threshold (and isn't itself LLM-sourced).
    fn build_plan(&self, diagnosis: &ErrorDiagnosis, now_ms: i64) -> Vec<FixAction> {
        let mut plan = FixPlanner::plan(diagnosis, |_tag| 0.0);
        if let Some(suggested) = self.history.suggest(diagnosis, now_ms) {
            if suggested.source != FixSource::Llm {
                plan.insert(0, suggested);
            }
        }
        plan
    }

    async fn try_plan(&self, plan: &[FixAction], diagnosis: &ErrorDiagnosis, project: &ProjectContext, now_ms: i64) -> PlanOutcome {
        let signature = error_signature(diagnosis.pattern, &diagnosis.description);

        for action in plan {
            let validation = Validator::validate(action, project);
            if !validation.can_proceed {
                self.history.record_failure(&signature, diagnosis.pattern, &action.kind, 0.0, now_ms);
                continue;
            }

            let risk = RiskAssessor::assess(action);
            if !self.strategy.auto_apply_fixes && risk.level > self.strategy.max_auto_risk {
                return PlanOutcome::Refused { action: action.clone(), risk: risk.level };
            }

            let backup = if risk.requires_backup { self.snapshot(action).await.ok() } else { None };

            let started = std::time::Instant::now();
            let outcome = self.applier.apply(action, project).await;
            let duration_ms = started.elapsed().as_secs_f64() * 1_000.0;

            match outcome {
                Ok(()) => {
                    self.history.record_success(&signature, diagnosis.pattern, &action.kind, duration_ms, now_ms);
                    return PlanOutcome::Recovered;
                }
                Err(_) => {
                    if let Some(entry) = backup {
                        let _ = self.rollback.rollback(&entry).await;
                    }
                    self.history.record_failure(&signature, diagnosis.pattern, &action.kind, duration_ms, now_ms);
                }
            }
        }
        PlanOutcome::Exhausted
    }

    async fn snapshot(&self, action: &FixAction) -> std::io::Result<boe_core::rollback::RollbackEntry> {
        match &action.kind {
            FixKind::ModifyFile { path, .. } | FixKind::FixCMakeVersion { path, .. } => self.rollback.record_before_modify(path).await,
            FixKind::DeleteFile { path } => self.rollback.record_before_delete(path).await,
            FixKind::CreateFile { path, .. } => Ok(self.rollback.record_create(path)),
            _ => Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "no snapshot target for this fix kind")),
        }
    }
}

enum PlanOutcome {
    Recovered,
    Exhausted,
    Refused { action: FixAction, risk: RiskLevel },
}

/// Default [`BuildRunner`], thin over [`boe_adapters::execute_build`].
pub struct ProjectBuildRunner {
    pub invocation: boe_adapters::BuildInvocation,
    pub timeout: Duration,
}

#[async_trait]
impl BuildRunner for ProjectBuildRunner {
    async fn run_build(&self, project: &ProjectContext) -> BuildResult {
        boe_adapters::execute_build(project, &self.invocation, self.timeout).await
    }
}

/// Default [`ActionApplier`]: performs filesystem edits directly and
/// shells out for package installs / arbitrary commands via
/// `boe-adapters`.
#[derive(Default)]
pub struct DefaultActionApplier {
    pub command_timeout: Duration,
}

impl DefaultActionApplier {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }
}

#[async_trait]
impl ActionApplier for DefaultActionApplier {
    async fn apply(&self, action: &FixAction, project: &ProjectContext) -> Result<(), String> {
        match &action.kind {
            FixKind::InstallPackage { name } => {
                let output = boe_adapters::package_install(name, self.command_timeout).await?;
                if output.status.success() {
                    Ok(())
                } else {
                    Err(format!("package install for '{name}' exited with {}", output.status))
                }
            }
            FixKind::RunCommand { cmd } => run_shell(cmd, &project.root, self.command_timeout).await,
            FixKind::CreateFile { path, content } => {
                let target = resolve(project, path);
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| e.to_string())?;
                }
                tokio::fs::write(&target, content).await.map_err(|e| e.to_string())
            }
            FixKind::ModifyFile { path, patch } => {
                let target = resolve(project, path);
                tokio::fs::write(&target, patch).await.map_err(|e| e.to_string())
            }
            FixKind::DeleteFile { path } => tokio::fs::remove_file(resolve(project, path)).await.map_err(|e| e.to_string()),
            FixKind::FixCMakeVersion { path, new_version } => bump_cmake_version(&resolve(project, path), new_version).await,
            FixKind::SetEnvVar { key, value } => {
                // SAFETY-equivalent: process-wide env mutation, visible to
                // subsequent subprocess invocations in this recovery attempt.
                std::env::set_var(key, value);
                Ok(())
            }
            FixKind::CleanBuild { dir } => {
                let target = resolve(project, dir);
                if target.exists() {
                    tokio::fs::remove_dir_all(&target).await.map_err(|e| e.to_string())
                } else {
                    Ok(())
                }
            }
            FixKind::Retry | FixKind::Noop => Ok(()),
        }
    }
}

fn resolve(project: &ProjectContext, path: &std::path::Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project.root.join(path)
    }
}

async fn run_shell(cmd: &str, cwd: &std::path::Path, timeout: Duration) -> Result<(), String> {
    let mut command = tokio::process::Command::new("sh");
    command.arg("-c").arg(cmd).current_dir(cwd);
    let output = boe_adapters::subprocess::run_with_timeout(command, timeout, cmd).await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!("`{cmd}` exited with {}", output.status))
    }
}

async fn bump_cmake_version(path: &std::path::Path, new_version: &str) -> Result<(), String> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| e.to_string())?;
    let needle = "cmake_minimum_required";
    let Some(start) = content.find(needle) else {
        return Err(format!("no {needle} directive found in {}", path.display()));
    };
    let Some(close) = content[start..].find(')') else {
        return Err(format!("unterminated {needle} directive in {}", path.display()));
    };
    let rewritten = format!(
        "{}cmake_minimum_required(VERSION {new_version}){}",
        &content[..start],
        &content[start + close + 1..]
    );
    tokio::fs::write(path, rewritten).await.map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
