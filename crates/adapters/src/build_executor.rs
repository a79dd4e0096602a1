// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invokes a project's native build tool and captures its outcome.

use crate::subprocess::run_with_timeout;
use boe_core::build_result::BuildResult;
use boe_core::project::ProjectContext;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::Instrument;

/// A build invocation: the program to run, its arguments, and where to
/// look for the artifacts it produces (paths relative to `project.root`).
#[derive(Debug, Clone)]
pub struct BuildInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub artifact_globs: Vec<String>,
}

/// Runs `invocation` inside `project.root`, capturing stdout/stderr/exit
/// code and wall-clock duration into a [`BuildResult`]. Never returns an
/// `Err`: a process that can't even be spawned, or that times out, is
/// itself a build failure the recovery engine needs to see, not an
/// exceptional condition for the caller to handle separately.
pub async fn execute_build(
    project: &ProjectContext,
    invocation: &BuildInvocation,
    timeout: Duration,
) -> BuildResult {
    let span = tracing::info_span!("build.execute", program = %invocation.program, root = %project.root.display());
    async {
        let start = Instant::now();
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&project.root);

        let result = run_with_timeout(cmd, timeout, &invocation.program).await;
        let duration_sec = start.elapsed().as_secs_f64();

        match result {
            Ok(output) if output.status.success() => {
                let artifacts = resolve_artifacts(project, &invocation.artifact_globs);
                tracing::info!(elapsed_sec = duration_sec, artifact_count = artifacts.len(), "build succeeded");
                let mut build = BuildResult::success(duration_sec, artifacts);
                build.stdout = output.stdout;
                build.stderr = output.stderr;
                build
            }
            Ok(output) => {
                let exit_code = output.status.code().unwrap_or(-1);
                tracing::warn!(elapsed_sec = duration_sec, exit_code, "build failed");
                BuildResult::failure(exit_code, output.stdout, output.stderr, duration_sec)
            }
            Err(message) => {
                tracing::error!(elapsed_sec = duration_sec, error = %message, "build could not run to completion");
                BuildResult::failure(-1, Vec::new(), message.into_bytes(), duration_sec)
            }
        }
    }
    .instrument(span)
    .await
}

fn resolve_artifacts(project: &ProjectContext, globs: &[String]) -> Vec<std::path::PathBuf> {
    globs
        .iter()
        .map(|pattern| project.root.join(pattern))
        .filter(|path| path.exists())
        .collect()
}

/// The invocation run when a project doesn't supply its own, keyed on
/// `project.build_system`. Unrecognized names fall back to `make`, the
/// same default a bare `cmake`-less C project would use.
const DEFAULT_INVOCATIONS: &[(&str, &str, &[&str])] = &[
    ("cmake", "cmake", &["--build", "build"]),
    ("make", "make", &[]),
    ("ninja", "ninja", &[]),
    ("cargo", "cargo", &["build", "--release"]),
    ("npm", "npm", &["run", "build"]),
];

/// Picks the build command for `project` from [`DEFAULT_INVOCATIONS`], for
/// callers (the scheduler, the CLI) that don't have a project-supplied
/// invocation of their own.
pub fn default_invocation(project: &ProjectContext) -> BuildInvocation {
    let (program, args) = DEFAULT_INVOCATIONS
        .iter()
        .find(|(name, _, _)| *name == project.build_system)
        .map(|(_, program, args)| (*program, *args))
        .unwrap_or(("make", &[]));
    BuildInvocation {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        artifact_globs: Vec::new(),
    }
}

#[cfg(test)]
#[path = "build_executor_tests.rs"]
mod tests;
