// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! End-to-end recovery and scheduling scenarios driven against
//! boe-engine's public API: a missing-library fix, a CMake version bump,
//! worker selection under load, and job re-assignment on disconnect.

use async_trait::async_trait;
use boe_core::build_result::BuildResult;
use boe_core::fix_action::{FixAction, FixKind};
use boe_core::job::{DistributionStrategy, JobState};
use boe_core::project::{DependencySpec, ProjectContext, SourceFileSummary};
use boe_core::worker::{Capabilities, SystemInfo, ToolInfo, WorkerId};
use boe_engine::{
    ActionApplier, BuildRunner, RecoveryEngine, RecoveryOutcome, RecoveryStrategy, RollbackManager, Scheduler, SelectionCriteria,
    WorkerRegistry,
};
use boe_storage::fix_history::FixHistory;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

struct ScriptedBuildRunner {
    results: Mutex<VecDeque<BuildResult>>,
}

impl ScriptedBuildRunner {
    fn new(results: Vec<BuildResult>) -> Self {
        Self { results: Mutex::new(results.into_iter().collect()) }
    }
}

#[async_trait]
impl BuildRunner for ScriptedBuildRunner {
    async fn run_build(&self, _project: &ProjectContext) -> BuildResult {
        let mut results = self.results.lock();
        if results.len() > 1 {
            results.pop_front().expect("checked len")
        } else {
            results.front().cloned().expect("at least one scripted result")
        }
    }
}

/// Accepts every fix it's asked to apply, recording the attempted kinds
/// so a scenario can assert on what was actually planned.
struct AcceptingApplier {
    applied: Mutex<Vec<FixKind>>,
}

impl AcceptingApplier {
    fn new() -> Self {
        Self { applied: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl ActionApplier for AcceptingApplier {
    async fn apply(&self, action: &FixAction, _project: &ProjectContext) -> Result<(), String> {
        self.applied.lock().push(action.kind.clone());
        Ok(())
    }
}

fn curl_project() -> ProjectContext {
    ProjectContext::new("/tmp/curl-project", "c", "cmake")
        .with_dependencies(vec![DependencySpec::new("curl", false)])
        .with_source_summary(SourceFileSummary::default())
}

/// S1 -- Missing library fix: a project missing `curl` fails to link,
/// the planner's first action installs the package, and the retry that
/// follows succeeds.
#[tokio::test]
async fn s1_missing_library_fix_recovers_on_first_retry() {
    let project = curl_project();
    let failing = BuildResult::failure(1, Vec::new(), b"undefined reference to `curl_easy_init'".to_vec(), 1.0);
    let succeeding = BuildResult::success(0.5, vec![PathBuf::from("build/out")]);
    let builder = ScriptedBuildRunner::new(vec![failing, succeeding]);
    let applier = AcceptingApplier::new();

    let history_path = tempfile::NamedTempFile::new().expect("tempfile").path().to_path_buf();
    let history = Arc::new(FixHistory::load(&history_path).expect("fresh history loads"));
    let rollback = RollbackManager::new(std::env::temp_dir().join("boe-s1-sidecars"));

    let strategy = RecoveryStrategy {
        auto_apply_fixes: true,
        ..RecoveryStrategy::default()
    };
    let engine = RecoveryEngine::new(builder, applier, history, rollback, strategy);

    let outcome = engine.recover(&project, 0).await;
    match outcome {
        RecoveryOutcome::Success { result, stats } => {
            assert!(result.success);
            assert_eq!(stats.total_attempts, 2, "one failing attempt, one successful retry");
            assert_eq!(stats.successful_recoveries, 1);
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

fn cmake_project_with_old_version(cmakelists: &std::path::Path) -> ProjectContext {
    std::fs::write(cmakelists, "cmake_minimum_required(VERSION 3.10)\nproject(demo)\n").expect("write CMakeLists.txt");
    ProjectContext::new(cmakelists.parent().expect("has parent"), "c", "cmake")
}

/// S2 -- CMake version bump: the stderr names the required version, the
/// planner emits `FixCMakeVersion`, and applying it (for real, through
/// `DefaultActionApplier`) rewrites the file while leaving a rollback
/// entry that restores the original text.
#[tokio::test]
async fn s2_cmake_version_bump_and_rollback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cmakelists = dir.path().join("CMakeLists.txt");
    let project = cmake_project_with_old_version(&cmakelists);

    let failing = BuildResult::failure(1, Vec::new(), b"CMake Error at CMakeLists.txt:1 (cmake_minimum_required):\n  CMake 3.20 or higher is required.  You are running version 3.10".to_vec(), 1.0);
    let builder = ScriptedBuildRunner::new(vec![failing.clone()]);
    let applier = boe_engine::DefaultActionApplier::new(std::time::Duration::from_secs(5));

    let history_path = dir.path().join("fix-history.json");
    let history = Arc::new(FixHistory::load(&history_path).expect("fresh history loads"));
    let sidecar_dir = dir.path().join("sidecars");

    // max_retries=1 so the loop runs exactly one attempt and reports the
    // plan it tried, without looping back into ScriptedBuildRunner's
    // single scripted (failing) result forever.
    let strategy = RecoveryStrategy {
        max_retries: 1,
        auto_apply_fixes: true,
        ..RecoveryStrategy::default()
    };
    let engine = RecoveryEngine::new(builder, applier, history, RollbackManager::new(sidecar_dir.clone()), strategy);

    let outcome = engine.recover(&project, 0).await;
    let rewritten = std::fs::read_to_string(&cmakelists).expect("CMakeLists.txt still present");
    assert!(rewritten.contains("3.20"), "expected version bumped to 3.20, got: {rewritten}");

    match outcome {
        RecoveryOutcome::Exhausted { .. } => {}
        other => panic!("expected Exhausted after the single scripted failure, got {other:?}"),
    }

    // The fix was applied directly against the real file, so a manual
    // rollback using the same manager's `record_before_modify` snapshot
    // semantics demonstrates the original text is recoverable: re-run the
    // capture-then-restore steps the engine itself would have taken before
    // the overwrite, against a fresh copy.
    let original = dir.path().join("CMakeLists.txt.original");
    std::fs::write(&original, "cmake_minimum_required(VERSION 3.10)\nproject(demo)\n").expect("seed original");
    let rollback = RollbackManager::new(sidecar_dir);
    let entry = rollback.record_before_modify(&original).await.expect("snapshot");
    std::fs::write(&original, "cmake_minimum_required(VERSION 3.20)\nproject(demo)\n").expect("simulate bump");
    rollback.rollback(&entry).await.expect("rollback");
    let restored = std::fs::read_to_string(&original).expect("restored file");
    assert!(restored.contains("3.10"), "rollback should restore the pre-bump version, got: {restored}");
}

fn worker_a() -> (WorkerId, SystemInfo, Vec<ToolInfo>, Capabilities) {
    (
        WorkerId::new("worker-a"),
        SystemInfo { os: "linux".into(), arch: "x86_64".into(), cpu_count: 8, total_memory_mb: 16_384 },
        vec![ToolInfo { name: "cmake".into(), version: "3.28".into(), path: "/usr/bin/cmake".into() }],
        Capabilities::CMAKE | Capabilities::GCC,
    )
}

fn worker_b() -> (WorkerId, SystemInfo, Vec<ToolInfo>, Capabilities) {
    (
        WorkerId::new("worker-b"),
        SystemInfo { os: "linux".into(), arch: "aarch64".into(), cpu_count: 8, total_memory_mb: 16_384 },
        vec![ToolInfo { name: "gcc".into(), version: "12".into(), path: "/usr/bin/gcc".into() }],
        Capabilities::GCC,
    )
}

/// S4 -- Worker selection: a worker with fewer running jobs, the
/// preferred capability, and a matching architecture outranks a busier,
/// architecture-mismatched, capability-poorer one.
#[test]
fn s4_worker_selection_prefers_idle_matching_capable_worker() {
    let registry = WorkerRegistry::new(30_000, 3);

    let (id_a, info_a, tools_a, caps_a) = worker_a();
    registry.register(id_a.clone(), info_a, tools_a, caps_a, 8, 0);
    registry.update_job_count(&id_a, 4); // 4/8 slots used

    let (id_b, info_b, tools_b, caps_b) = worker_b();
    registry.register(id_b.clone(), info_b, tools_b, caps_b, 8, 0);
    registry.update_job_count(&id_b, 7); // 7/8 slots used

    let criteria = SelectionCriteria {
        required_capabilities: Capabilities::GCC,
        preferred_capabilities: Capabilities::CMAKE,
        slots_needed: 1,
        prefer_idle: true,
        native_arch: Some("x86_64".to_string()),
        native_os: None,
    };

    let selected = registry.select(&criteria).expect("a worker should be selected");
    assert_eq!(selected, id_a);

    let ranked = registry.select_many(&criteria, 2);
    assert_eq!(ranked.first(), Some(&id_a));
}

/// S6 -- Job re-assignment on disconnect: a running job returns to
/// Pending when its worker disconnects, and is picked up by the
/// remaining worker on the next `process_queue` pass; the disconnected
/// worker is removed from the registry.
#[test]
fn s6_job_reassigned_after_worker_disconnect() {
    let registry = WorkerRegistry::new(30_000, 3);
    let scheduler: Scheduler = Scheduler::new();

    let (id_w, info_w, tools_w, caps_w) = worker_a();
    registry.register(id_w.clone(), info_w, tools_w, caps_w, 1, 0);

    let project = ProjectContext::new("/tmp/s6-project", "c", "make");
    let session = scheduler.create_build(&project, DistributionStrategy::WholeProject, 0);
    let job_id = session.jobs[0].clone();

    let dispatched = scheduler.process_queue(&registry);
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].worker_id, id_w);
    assert_eq!(scheduler.get_job(&job_id).expect("job exists").state, JobState::Running);

    // W disconnects: its running job goes back to Pending, and the
    // registry forgets about it.
    scheduler.handle_worker_disconnect(&id_w);
    registry.remove(&id_w);
    assert_eq!(scheduler.get_job(&job_id).expect("job exists").state, JobState::Pending);
    assert!(registry.get(&id_w).is_none());

    // A fresh worker W' registers and the next process_queue pass offers
    // the job to it.
    let (id_w2, info_w2, tools_w2, caps_w2) = worker_b();
    registry.register(id_w2.clone(), info_w2, tools_w2, caps_w2, 1, 1_000);

    let redispatched = scheduler.process_queue(&registry);
    assert_eq!(redispatched.len(), 1);
    assert_eq!(redispatched[0].worker_id, id_w2);
    assert_eq!(scheduler.get_job(&job_id).expect("job exists").state, JobState::Running);
}
