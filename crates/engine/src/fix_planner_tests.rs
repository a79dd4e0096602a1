// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use boe_core::fix_action::FixKind;

#[test]
fn missing_library_with_target_plans_an_install() {
    let diag = ErrorDiagnosis::new(ErrorPatternKind::MissingLibrary, 0.9, "x").with_target("curl");
    let plan = FixPlanner::plan(&diag, |_| 0.0);
    assert_eq!(plan.len(), 3);
    assert!(matches!(plan[0].kind, FixKind::InstallPackage { ref name } if name == "libcurl-dev"));
    assert!(matches!(plan[1].kind, FixKind::CleanBuild { .. }));
    assert!(matches!(plan[2].kind, FixKind::Retry));
}

#[test]
fn missing_library_without_target_falls_back_to_ldconfig() {
    let diag = ErrorDiagnosis::new(ErrorPatternKind::MissingLibrary, 0.5, "x");
    let plan = FixPlanner::plan(&diag, |_| 0.0);
    assert!(matches!(plan[0].kind, FixKind::RunCommand { ref cmd } if cmd.contains("ldconfig")));
}

#[test]
fn cmake_version_uses_extracted_target_version() {
    let diag = ErrorDiagnosis::new(ErrorPatternKind::CMakeVersion, 0.9, "x").with_target("3.25");
    let plan = FixPlanner::plan(&diag, |_| 0.0);
    assert!(matches!(&plan[0].kind, FixKind::FixCMakeVersion { new_version, .. } if new_version == "3.25"));
}

#[test]
fn disk_full_plans_a_clean_build() {
    let diag = ErrorDiagnosis::new(ErrorPatternKind::DiskFull, 0.9, "x");
    let plan = FixPlanner::plan(&diag, |_| 0.0);
    assert!(matches!(plan[0].kind, FixKind::CleanBuild { .. }));
}

#[test]
fn unknown_pattern_plans_a_retry() {
    let diag = ErrorDiagnosis::new(ErrorPatternKind::Unknown, 0.1, "x");
    let plan = FixPlanner::plan(&diag, |_| 0.0);
    assert!(matches!(plan[0].kind, FixKind::Retry));
}

#[test]
fn missing_file_with_target_plans_a_create_then_install() {
    let diag = ErrorDiagnosis::new(ErrorPatternKind::MissingFile, 0.8, "x").with_target("config.h");
    let plan = FixPlanner::plan(&diag, |_| 0.0);
    assert!(matches!(plan[0].kind, FixKind::CreateFile { ref path, .. } if path.to_str() == Some("config.h")));
    assert!(matches!(plan[1].kind, FixKind::InstallPackage { .. }));
}

#[test]
fn permission_denied_plans_a_chmod_then_retry() {
    let diag = ErrorDiagnosis::new(ErrorPatternKind::PermissionDenied, 0.9, "x").with_target("build.sh");
    let plan = FixPlanner::plan(&diag, |_| 0.0);
    assert!(matches!(plan[0].kind, FixKind::RunCommand { ref cmd } if cmd.contains("build.sh")));
    assert!(matches!(plan[1].kind, FixKind::Retry));
}
