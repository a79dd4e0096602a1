// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns an error diagnosis into an ordered list of candidate fixes.

use boe_core::error_pattern::{ErrorDiagnosis, ErrorPatternKind};
use boe_core::fix_action::{FixAction, FixSource};

/// Deterministic mapping from failure class to the fixes worth trying,
/// most-likely-to-help first. A missing target (e.g. the matcher
/// couldn't extract a library name) degrades each fix to a more generic
/// form rather than omitting it.
pub struct FixPlanner;

impl FixPlanner {
    /// Produces the candidate fixes for `diagnosis`, then reorders them by
    /// historical success score when `score_of` returns a positive score
    /// for a candidate's tag. Candidates with no track record (or when
    /// `score_of` is `None`) keep the planner's original, pattern-derived
    /// order -- `sort_by` is stable, so ties never reshuffle.
    pub fn plan(diagnosis: &ErrorDiagnosis, score_of: impl Fn(&str) -> f64) -> Vec<FixAction> {
        let mut candidates = Self::candidates_for(diagnosis);
        candidates.sort_by(|a, b| {
            score_of(b.kind.tag())
                .partial_cmp(&score_of(a.kind.tag()))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates
    }

    /// Priority-ordered plan per pattern: most fixes chain
    /// `CleanBuild -> Retry` (or just `Retry`)
    /// after the corrective step, so a worked-around build actually gets
    /// re-attempted rather than leaving the caller to notice on its own.
    fn candidates_for(diagnosis: &ErrorDiagnosis) -> Vec<FixAction> {
        let target = diagnosis.extracted_target.as_deref();
        match diagnosis.pattern {
            ErrorPatternKind::MissingLibrary => match target {
                Some(lib) => vec![
                    FixAction::install_package(package_name_for_lib(lib), FixSource::Planner),
                    FixAction::clean_build("build", FixSource::Planner),
                    FixAction::retry(),
                ],
                None => vec![FixAction::run_command("ldconfig -p", FixSource::Planner), FixAction::retry()],
            },
            ErrorPatternKind::UndefinedReference => match target {
                Some(symbol) => vec![
                    FixAction::install_package(package_name_for_lib(symbol), FixSource::Planner),
                    FixAction::clean_build("build", FixSource::Planner),
                    FixAction::retry(),
                ],
                None => vec![FixAction::retry()],
            },
            ErrorPatternKind::MissingHeader => match target {
                Some(header) => vec![
                    FixAction::install_package(package_name_for_header(header), FixSource::Planner),
                    FixAction::clean_build("build", FixSource::Planner),
                    FixAction::retry(),
                ],
                None => vec![FixAction::retry()],
            },
            ErrorPatternKind::MissingFile => match target {
                Some(path) => vec![
                    FixAction::create_file(path, "", FixSource::Planner),
                    FixAction::install_package(package_name_for_header(path), FixSource::Planner),
                ],
                None => vec![FixAction::retry()],
            },
            ErrorPatternKind::PermissionDenied => {
                let target = target.unwrap_or(".");
                vec![
                    FixAction::run_command(format!("chmod +x {target}"), FixSource::Planner),
                    FixAction::retry(),
                ]
            }
            ErrorPatternKind::CMakeVersion => match target {
                Some(version) => vec![FixAction::fix_cmake_version("CMakeLists.txt", version, FixSource::Planner)],
                None => vec![FixAction::fix_cmake_version("CMakeLists.txt", "3.20", FixSource::Planner)],
            },
            ErrorPatternKind::DiskFull => vec![FixAction::clean_build("build", FixSource::Planner), FixAction::retry()],
            ErrorPatternKind::SyntaxError => vec![FixAction::noop()],
            ErrorPatternKind::Unknown => vec![FixAction::retry()],
        }
    }
}

/// Best-effort mapping from a library/symbol name to a Debian/Ubuntu
/// package name. Coarse on purpose: the recovery engine treats this as a
/// suggestion requiring confirmation, not ground truth.
fn package_name_for_lib(lib: &str) -> String {
    let lib = lib.trim_start_matches("lib");
    format!("lib{lib}-dev")
}

fn package_name_for_header(header: &str) -> String {
    let root = header.split('/').next().unwrap_or(header).trim_end_matches(".h");
    format!("lib{root}-dev")
}

#[cfg(test)]
#[path = "fix_planner_tests.rs"]
mod tests;
