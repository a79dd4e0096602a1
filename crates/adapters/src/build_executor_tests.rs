// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use boe_core::project::ProjectContext;

fn project(root: &std::path::Path) -> ProjectContext {
    ProjectContext::new(root, "c", "make")
}

#[tokio::test]
async fn successful_command_produces_a_success_result() {
    let dir = tempfile::tempdir().unwrap();
    let invocation = BuildInvocation {
        program: "true".to_string(),
        args: vec![],
        artifact_globs: vec![],
    };
    let result = execute_build(&project(dir.path()), &invocation, Duration::from_secs(5)).await;
    assert!(result.success);
    assert_eq!(result.exit_code, 0);
}

#[tokio::test]
async fn failing_command_captures_exit_code_and_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let invocation = BuildInvocation {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), "echo boom 1>&2; exit 3".to_string()],
        artifact_globs: vec![],
    };
    let result = execute_build(&project(dir.path()), &invocation, Duration::from_secs(5)).await;
    assert!(!result.success);
    assert_eq!(result.exit_code, 3);
    assert!(result.stderr_lossy().contains("boom"));
}

#[tokio::test]
async fn timeout_is_reported_as_a_failure_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let invocation = BuildInvocation {
        program: "sleep".to_string(),
        args: vec!["5".to_string()],
        artifact_globs: vec![],
    };
    let result = execute_build(&project(dir.path()), &invocation, Duration::from_millis(50)).await;
    assert!(!result.success);
    assert_eq!(result.exit_code, -1);
}

#[tokio::test]
async fn artifacts_are_resolved_relative_to_project_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("out.bin"), b"x").unwrap();
    let invocation = BuildInvocation {
        program: "true".to_string(),
        args: vec![],
        artifact_globs: vec!["out.bin".to_string(), "missing.bin".to_string()],
    };
    let result = execute_build(&project(dir.path()), &invocation, Duration::from_secs(5)).await;
    assert_eq!(result.artifacts, vec![dir.path().join("out.bin")]);
}

#[test]
fn default_invocation_maps_known_build_systems() {
    let dir = tempfile::tempdir().unwrap();
    let cmake = ProjectContext::new(dir.path(), "c", "cmake");
    assert_eq!(default_invocation(&cmake).program, "cmake");

    let cargo = ProjectContext::new(dir.path(), "rust", "cargo");
    assert_eq!(default_invocation(&cargo).program, "cargo");
    assert_eq!(default_invocation(&cargo).args, vec!["build", "--release"]);
}

#[test]
fn default_invocation_falls_back_to_make_for_unknown_build_systems() {
    let dir = tempfile::tempdir().unwrap();
    let unknown = ProjectContext::new(dir.path(), "c", "scons");
    assert_eq!(default_invocation(&unknown).program, "make");
}
