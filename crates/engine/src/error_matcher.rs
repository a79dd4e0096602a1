// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classifies a failed build's output against a table of known error shapes.

use boe_core::build_result::BuildResult;
use boe_core::error_pattern::{ErrorDiagnosis, ErrorPattern, ErrorPatternKind};

/// One row of the matcher's table: the substrings that indicate this
/// failure class, and the priority used to break ties when a line matches
/// more than one pattern's needles.
struct PatternRule {
    pattern: ErrorPattern,
    needles: &'static [&'static str],
    extract_target: fn(&str) -> Option<String>,
}

/// Ordered table of known build failure patterns, checked from highest to
/// lowest priority. The order here, not insertion order into a map, is
/// what makes matching deterministic when output matches more than one
/// rule's needles.
pub struct ErrorMatcher {
    rules: Vec<PatternRule>,
}

impl ErrorMatcher {
    pub fn with_default_rules() -> Self {
        Self {
            rules: vec![
                PatternRule {
                    pattern: ErrorPattern::new(ErrorPatternKind::CMakeVersion, 100),
                    needles: &["cmake_minimum_required", "CMake Error at", "requires CMake"],
                    extract_target: extract_after_colon,
                },
                PatternRule {
                    pattern: ErrorPattern::new(ErrorPatternKind::MissingLibrary, 90),
                    needles: &["cannot find -l", "error while loading shared libraries", "Could NOT find"],
                    extract_target: extract_library_name,
                },
                PatternRule {
                    pattern: ErrorPattern::new(ErrorPatternKind::UndefinedReference, 85),
                    needles: &["undefined reference to"],
                    extract_target: extract_after_last_to,
                },
                PatternRule {
                    pattern: ErrorPattern::new(ErrorPatternKind::MissingHeader, 80),
                    needles: &["fatal error:", "No such file or directory"],
                    extract_target: extract_header_name,
                },
                PatternRule {
                    pattern: ErrorPattern::new(ErrorPatternKind::MissingFile, 70),
                    needles: &["No such file or directory"],
                    extract_target: |_| None,
                },
                PatternRule {
                    pattern: ErrorPattern::new(ErrorPatternKind::PermissionDenied, 60),
                    needles: &["Permission denied"],
                    extract_target: |_| None,
                },
                PatternRule {
                    pattern: ErrorPattern::new(ErrorPatternKind::DiskFull, 50),
                    needles: &["No space left on device"],
                    extract_target: |_| None,
                },
                PatternRule {
                    pattern: ErrorPattern::new(ErrorPatternKind::SyntaxError, 40),
                    needles: &["error: expected", "syntax error"],
                    extract_target: |_| None,
                },
            ],
        }
    }

    /// Diagnoses a failed build. Returns `ErrorPatternKind::Unknown` with
    /// low confidence if nothing in the table matches, rather than an
    /// `Option` -- the recovery engine always has a diagnosis to act on,
    /// even an uninformative one.
    pub fn diagnose(&self, result: &BuildResult) -> ErrorDiagnosis {
        debug_assert!(!result.success, "only failed builds should be diagnosed");
        let haystack = result.stderr_lossy();

        let best = self
            .rules
            .iter()
            .filter(|rule| rule.needles.iter().any(|needle| haystack.contains(needle)))
            .max_by_key(|rule| rule.pattern.priority);

        match best {
            Some(rule) => {
                let target = (rule.extract_target)(&haystack);
                let mut diagnosis = ErrorDiagnosis::new(
                    rule.pattern.kind,
                    confidence_for_match(rule.pattern.priority, target.is_some()),
                    rule.pattern.kind.description(),
                );
                if let Some(target) = target {
                    diagnosis = diagnosis.with_target(target);
                }
                diagnosis
            }
            None => ErrorDiagnosis::new(ErrorPatternKind::Unknown, 0.1, ErrorPatternKind::Unknown.description()),
        }
    }
}

impl Default for ErrorMatcher {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

/// A rule that matched but couldn't extract a target is just a needle hit
/// with no corroborating detail, so it gets a flat low confidence no
/// matter how high that rule's priority is. Once a target is extracted,
/// confidence scales with priority -- the rule that fired is more likely
/// to be the true cause the more specific its needles are.
fn confidence_for_match(priority: u8, has_target: bool) -> f64 {
    if !has_target {
        return 0.3;
    }
    (f64::from(priority) / 100.0).clamp(0.6, 1.0)
}

fn extract_after_colon(line: &str) -> Option<String> {
    line.lines().find(|l| l.contains("requires CMake"))
        .and_then(|l| l.split("requires CMake").nth(1))
        .map(|s| s.trim().trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '.').to_string())
        .filter(|s| !s.is_empty())
}

fn extract_library_name(line: &str) -> Option<String> {
    line.lines()
        .find_map(|l| l.split_once("cannot find -l").map(|(_, rest)| rest.trim().to_string()))
        .filter(|s| !s.is_empty())
}

fn extract_after_last_to(line: &str) -> Option<String> {
    line.lines()
        .find(|l| l.contains("undefined reference to"))
        .and_then(|l| l.split("undefined reference to").nth(1))
        .map(|s| s.trim().trim_matches(|c: char| c == '`' || c == '\'').to_string())
        .filter(|s| !s.is_empty())
}

fn extract_header_name(line: &str) -> Option<String> {
    line.lines()
        .find(|l| l.contains("fatal error:"))
        .and_then(|l| l.split("fatal error:").nth(1))
        .map(|s| s.split(':').next().unwrap_or(s).trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "error_matcher_tests.rs"]
mod tests;
