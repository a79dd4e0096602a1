// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal stand-in for a full (deliberately out-of-scope) project
//! analyzer: just enough file-presence sniffing to hand the
//! Recovery Engine a [`ProjectContext`] for `boe build`. A real analyzer
//! would walk the source tree and parse manifests; this only distinguishes
//! build systems by the marker file each one leaves at the project root.

use boe_core::project::{DependencySpec, ProjectContext, SourceFileSummary};
use std::path::Path;

const MARKERS: &[(&str, &str, &str)] = &[
    ("Cargo.toml", "rust", "cargo"),
    ("CMakeLists.txt", "c", "cmake"),
    ("package.json", "javascript", "npm"),
    ("build.ninja", "c", "ninja"),
    ("Makefile", "c", "make"),
];

/// Builds a [`ProjectContext`] for `root` by checking for each known
/// build-system marker file in priority order, falling back to `make`/`c`
/// when nothing recognizable is present.
pub fn detect(root: &Path) -> ProjectContext {
    let (language, build_system) = MARKERS
        .iter()
        .find(|(marker, _, _)| root.join(marker).is_file())
        .map(|(_, language, build_system)| (*language, *build_system))
        .unwrap_or(("unknown", "make"));

    let source_summary = summarize_sources(root);

    ProjectContext::new(root, language, build_system)
        .with_dependencies(Vec::<DependencySpec>::new())
        .with_source_summary(source_summary)
}

/// Coarse, non-recursive file count/byte total over `root` -- enough for
/// `source_summary` without walking the whole tree on every invocation.
fn summarize_sources(root: &Path) -> SourceFileSummary {
    let mut summary = SourceFileSummary::default();
    let Ok(entries) = std::fs::read_dir(root) else {
        return summary;
    };
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else { continue };
        if metadata.is_file() {
            summary.file_count += 1;
            summary.total_bytes += metadata.len();
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detects_cargo_projects() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]\n").unwrap();

        let project = detect(dir.path());
        assert_eq!(project.language, "rust");
        assert_eq!(project.build_system, "cargo");
    }

    #[test]
    fn detects_cmake_projects() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("CMakeLists.txt"), "cmake_minimum_required(VERSION 3.10)\n").unwrap();

        let project = detect(dir.path());
        assert_eq!(project.build_system, "cmake");
    }

    #[test]
    fn falls_back_to_make_when_nothing_recognizable_is_present() {
        let dir = TempDir::new().unwrap();

        let project = detect(dir.path());
        assert_eq!(project.build_system, "make");
    }
}
