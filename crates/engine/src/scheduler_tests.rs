use super::*;
use crate::worker_registry::WorkerRegistry;
use boe_core::job::JobState;
use boe_core::worker::{Capabilities, SystemInfo, WorkerId};
use boe_core::BuildResult;

fn project() -> ProjectContext {
    ProjectContext::new("/tmp/project", "cpp", "cmake")
}

fn system_info() -> SystemInfo {
    SystemInfo {
        os: "linux".into(),
        arch: "x86_64".into(),
        cpu_count: 4,
        total_memory_mb: 8_192,
    }
}

#[test]
fn create_build_with_whole_project_emits_exactly_one_job() {
    let scheduler = Scheduler::new();
    let session = scheduler.create_build(&project(), DistributionStrategy::WholeProject, 0);
    assert_eq!(session.jobs.len(), 1);
    assert_eq!(session.state, BuildSessionState::Running);
}

#[test]
fn create_build_records_a_dispatchable_invocation_per_job() {
    let scheduler = Scheduler::new();
    let session = scheduler.create_build(&project(), DistributionStrategy::WholeProject, 0);
    let invocation = scheduler.get_invocation(&session.jobs[0]).unwrap();
    assert_eq!(invocation.program, "cmake");
    assert_eq!(invocation.working_dir, std::path::Path::new("/tmp/project"));
}

#[test]
fn process_queue_assigns_pending_jobs_to_eligible_workers_fifo() {
    let scheduler = Scheduler::new();
    let registry = WorkerRegistry::default();
    let worker = WorkerId::new("w1");
    registry.register(worker.clone(), system_info(), Vec::new(), Capabilities::empty(), 2, 0);

    let session = scheduler.create_build(&project(), DistributionStrategy::WholeProject, 0);
    let dispatches = scheduler.process_queue(&registry);

    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].worker_id, worker);
    let job = scheduler.get_job(&session.jobs[0]).unwrap();
    assert_eq!(job.state, JobState::Running);
    assert_eq!(job.assigned_worker, Some(worker));
}

#[test]
fn process_queue_leaves_jobs_pending_when_no_eligible_worker() {
    let scheduler = Scheduler::new();
    let registry = WorkerRegistry::default();
    let session = scheduler.create_build(&project(), DistributionStrategy::WholeProject, 0);

    let dispatches = scheduler.process_queue(&registry);
    assert!(dispatches.is_empty());
    let job = scheduler.get_job(&session.jobs[0]).unwrap();
    assert_eq!(job.state, JobState::Pending);
}

#[test]
fn report_job_result_releases_worker_slot_and_finalizes_session() {
    let scheduler = Scheduler::new();
    let registry = WorkerRegistry::default();
    let worker = WorkerId::new("w1");
    registry.register(worker.clone(), system_info(), Vec::new(), Capabilities::empty(), 1, 0);

    let session = scheduler.create_build(&project(), DistributionStrategy::WholeProject, 0);
    scheduler.process_queue(&registry);
    assert_eq!(registry.get(&worker).unwrap().running_jobs, 1);

    let job_id = session.jobs[0].clone();
    scheduler
        .report_job_result(&job_id, BuildResult::success(1.0, vec![]), &registry, 100)
        .unwrap();

    assert_eq!(registry.get(&worker).unwrap().running_jobs, 0);
    let finished = scheduler.get_session(&session.id).unwrap();
    assert_eq!(finished.state, BuildSessionState::Completed);
}

#[test]
fn check_timeouts_requeues_overdue_running_jobs() {
    let scheduler = Scheduler::new();
    let registry = WorkerRegistry::default();
    let worker = WorkerId::new("w1");
    registry.register(worker, system_info(), Vec::new(), Capabilities::empty(), 1, 0);

    let session = scheduler.create_build(&project(), DistributionStrategy::WholeProject, 0);
    scheduler.process_queue(&registry);

    // DEFAULT_JOB_TIMEOUT_MS is 30 minutes; fast-forward past the deadline.
    let timed_out = scheduler.check_timeouts(DEFAULT_JOB_TIMEOUT_MS + 1);
    assert_eq!(timed_out, vec![session.jobs[0].clone()]);

    let job = scheduler.get_job(&session.jobs[0]).unwrap();
    assert_eq!(job.state, JobState::Pending, "requeued for another attempt");
}

#[test]
fn handle_worker_disconnect_returns_running_jobs_to_pending() {
    // S6: worker holding a Running job disconnects -> job goes back to Pending.
    let scheduler = Scheduler::new();
    let registry = WorkerRegistry::default();
    let worker = WorkerId::new("w1");
    registry.register(worker.clone(), system_info(), Vec::new(), Capabilities::empty(), 1, 0);

    let session = scheduler.create_build(&project(), DistributionStrategy::WholeProject, 0);
    scheduler.process_queue(&registry);
    let job_id = session.jobs[0].clone();
    assert_eq!(scheduler.get_job(&job_id).unwrap().state, JobState::Running);

    scheduler.handle_worker_disconnect(&worker);

    let job = scheduler.get_job(&job_id).unwrap();
    assert_eq!(job.state, JobState::Pending);
    assert!(job.assigned_worker.is_none());

    // And it's back on the queue: a fresh worker can pick it up.
    let other = WorkerId::new("w2");
    registry.register(other.clone(), system_info(), Vec::new(), Capabilities::empty(), 1, 10);
    let dispatches = scheduler.process_queue(&registry);
    assert_eq!(dispatches[0].worker_id, other);
}

#[test]
fn cancel_build_marks_non_terminal_jobs_cancelled() {
    let scheduler = Scheduler::new();
    let registry = WorkerRegistry::default();
    let session = scheduler.create_build(&project(), DistributionStrategy::WholeProject, 0);
    scheduler.process_queue(&registry);

    scheduler.cancel_build(&session.id, 50).unwrap();

    let job = scheduler.get_job(&session.jobs[0]).unwrap();
    assert_eq!(job.state, JobState::Cancelled);
    let finished = scheduler.get_session(&session.id).unwrap();
    assert_eq!(finished.state, BuildSessionState::Cancelled);
}
