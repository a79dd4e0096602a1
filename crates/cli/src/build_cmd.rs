// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `boe build <path>` -- drives the local recovery loop against a
//! project and prints the terminal outcome.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use boe_core::now_unix_ms;
use boe_engine::{
    DefaultActionApplier, ProjectBuildRunner, RecoveryEngine, RecoveryOutcome, RecoveryStrategy, RiskLevel, RollbackManager,
};
use boe_storage::FixHistory;

use crate::project_detect;
use crate::xdg;

pub struct BuildArgs {
    pub path: PathBuf,
    pub max_retries: u32,
    pub auto_apply: bool,
    pub build_timeout_sec: u64,
}

/// Runs `boe build`, returning the process exit code (0 on a recovered or
/// already-green build, non-zero otherwise -- never an `Err` for an
/// ordinary build failure, since that's the expected domain of this
/// command, not an exceptional condition).
pub async fn run(args: BuildArgs) -> Result<i32> {
    let root = args.path.canonicalize().with_context(|| format!("cannot resolve project path '{}'", args.path.display()))?;
    let project = project_detect::detect(&root);
    tracing::info!(root = %project.root.display(), language = %project.language, build_system = %project.build_system, "project detected");

    let invocation = boe_adapters::default_invocation(&project);
    let builder = ProjectBuildRunner { invocation, timeout: Duration::from_secs(args.build_timeout_sec) };
    let applier = DefaultActionApplier::new(Duration::from_secs(args.build_timeout_sec));

    let history = Arc::new(load_history()?);
    let rollback = RollbackManager::new(xdg::state_dir().join("rollback"));

    let strategy = RecoveryStrategy {
        max_retries: args.max_retries,
        auto_apply_fixes: args.auto_apply,
        ..RecoveryStrategy::default()
    };

    let engine = RecoveryEngine::new(builder, applier, history.clone(), rollback, strategy);
    let outcome = engine.recover(&project, now_unix_ms()).await;
    history.save().context("failed to persist fix history")?;

    Ok(report(&outcome))
}

fn load_history() -> Result<FixHistory> {
    let path = xdg::config_dir().join("fix_history.json");
    FixHistory::load(path).context("failed to load fix history")
}

/// Prints the terminal summary: the last `BuildResult` verbatim, then
/// `"N attempts, M recoveries"` -- and returns the process exit code.
fn report(outcome: &RecoveryOutcome) -> i32 {
    match outcome {
        RecoveryOutcome::Success { result, stats } => {
            print!("{}", result.stdout_lossy());
            eprintln!("build succeeded ({} attempts, {} recoveries)", stats.total_attempts, stats.successful_recoveries);
            0
        }
        RecoveryOutcome::Exhausted { last_result, stats, summary } => {
            print!("{}", last_result.stdout_lossy());
            eprint!("{}", last_result.stderr_lossy());
            eprintln!("{summary}");
            eprintln!("{} attempts, {} recoveries", stats.total_attempts, stats.successful_recoveries);
            if last_result.exit_code != 0 { last_result.exit_code } else { 1 }
        }
        RecoveryOutcome::PolicyRefusal { diagnosis, action, risk, stats } => {
            eprintln!("refused to auto-apply a {risk:?}-risk fix for {:?}: {}", diagnosis.pattern, action.description);
            eprintln!("pass --auto-apply to allow fixes up to this risk level");
            eprintln!("{} attempts, {} recoveries", stats.total_attempts, stats.successful_recoveries);
            risk_exit_code(*risk)
        }
    }
}

fn risk_exit_code(risk: RiskLevel) -> i32 {
    match risk {
        RiskLevel::None | RiskLevel::Low => 2,
        RiskLevel::Medium => 3,
        RiskLevel::High => 4,
        RiskLevel::Critical => 5,
    }
}
