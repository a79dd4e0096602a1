// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns the work queue and build sessions: decomposes a build into
//! jobs, dispatches them to the worker registry, and tracks terminal
//! state back up to the session.

use crate::worker_registry::{SelectionCriteria, WorkerRegistry};
use boe_core::id::{IdGen, UuidIdGen};
use boe_core::job::{BuildSession, BuildSessionId, BuildSessionState, DistributionStrategy, JobId, JobState, ScheduledJob};
use boe_core::project::ProjectContext;
use boe_core::protocol::JobInvocation;
use boe_core::worker::{Capabilities, WorkerId};
use boe_core::BuildResult;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Per-job requirements the project analyzer (external collaborator)
/// produces when decomposing a build. `WholeProject` always emits exactly
/// one, with no capability requirement beyond what the job needs to run
/// at all.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub required_capabilities: Capabilities,
    pub timeout_ms: i64,
    pub max_attempts: u32,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            required_capabilities: Capabilities::empty(),
            timeout_ms: DEFAULT_JOB_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

pub const DEFAULT_JOB_TIMEOUT_MS: i64 = 30 * 60 * 1000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT_RETRY_CAP: u32 = 3;

/// Decomposes a project into the jobs a [`DistributionStrategy`] calls
/// for. The finer-grained strategies (`CompileUnits`, `Targets`,
/// `Hybrid`) need a language-specific build graph this crate doesn't
/// have, so only [`WholeProject`] is provided here; a caller with that
/// knowledge supplies its own `JobSplitter`.
pub trait JobSplitter: Send + Sync {
    fn split(&self, project: &ProjectContext, strategy: DistributionStrategy) -> Vec<JobSpec>;
}

/// The only strategy this crate implements outright: the whole build runs
/// as a single job, regardless of the `strategy` argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeProject;

impl JobSplitter for WholeProject {
    fn split(&self, _project: &ProjectContext, _strategy: DistributionStrategy) -> Vec<JobSpec> {
        vec![JobSpec::default()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    SessionNotFound,
    JobNotFound,
}

/// An assignment made during [`Scheduler::process_queue`] that the
/// coordinator is responsible for actually sending over the wire -- the
/// scheduler owns job state, not network I/O.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub job_id: JobId,
    pub worker_id: WorkerId,
}

struct State {
    queue: VecDeque<JobId>,
    jobs: HashMap<JobId, ScheduledJob>,
    specs: HashMap<JobId, JobSpec>,
    invocations: HashMap<JobId, JobInvocation>,
    sessions: HashMap<BuildSessionId, BuildSession>,
}

pub struct Scheduler<S: JobSplitter = WholeProject, G: IdGen = UuidIdGen> {
    state: Mutex<State>,
    splitter: S,
    id_gen: G,
}

impl Scheduler<WholeProject, UuidIdGen> {
    pub fn new() -> Self {
        Self::with_splitter(WholeProject, UuidIdGen)
    }
}

impl Default for Scheduler<WholeProject, UuidIdGen> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: JobSplitter, G: IdGen> Scheduler<S, G> {
    pub fn with_splitter(splitter: S, id_gen: G) -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                jobs: HashMap::new(),
                specs: HashMap::new(),
                invocations: HashMap::new(),
                sessions: HashMap::new(),
            }),
            splitter,
            id_gen,
        }
    }

    /// Splits `project` via the configured [`JobSplitter`] and creates a
    /// new session in `Planning`, immediately transitioned to `Running`
    /// with its jobs enqueued.
    pub fn create_build(&self, project: &ProjectContext, strategy: DistributionStrategy, now_unix_ms: i64) -> BuildSession {
        let specs = self.splitter.split(project, strategy);
        let session_id = BuildSessionId::new(self.id_gen.next());
        let mut session = BuildSession::new(session_id.clone(), strategy, now_unix_ms);
        let default_invocation = boe_adapters::default_invocation(project);

        let mut state = self.state.lock();
        let mut job_ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let job_id = JobId::new(self.id_gen.next());
            let deadline = Some(now_unix_ms + spec.timeout_ms);
            let job = ScheduledJob::new(job_id.clone(), session_id.clone(), spec.max_attempts, now_unix_ms, deadline);
            let invocation = JobInvocation {
                program: default_invocation.program.clone(),
                args: default_invocation.args.clone(),
                working_dir: project.root.clone(),
                timeout_sec: (spec.timeout_ms.max(0) / 1000) as u64,
            };
            state.jobs.insert(job_id.clone(), job);
            state.specs.insert(job_id.clone(), spec);
            state.invocations.insert(job_id.clone(), invocation);
            state.queue.push_back(job_id.clone());
            job_ids.push(job_id);
        }
        session.start(job_ids);
        state.sessions.insert(session_id, session.clone());
        session
    }

    pub fn get_session(&self, id: &BuildSessionId) -> Option<BuildSession> {
        self.state.lock().sessions.get(id).cloned()
    }

    pub fn get_job(&self, id: &JobId) -> Option<ScheduledJob> {
        self.state.lock().jobs.get(id).cloned()
    }

    /// The wire-ready invocation for `job_id`, set when its session was
    /// created. Used by the coordinator to fill in `JobAssign` once
    /// [`Scheduler::process_queue`] picks a worker for it.
    pub fn get_invocation(&self, job_id: &JobId) -> Option<JobInvocation> {
        self.state.lock().invocations.get(job_id).cloned()
    }

    /// Attempts to assign every `Pending` job in FIFO order to a worker
    /// with matching capabilities, via `registry`. Jobs that find no
    /// eligible worker stay `Pending` at the front of the queue -- this
    /// call doesn't requeue them behind jobs it skipped, preserving FIFO.
    pub fn process_queue(&self, registry: &WorkerRegistry) -> Vec<Dispatch> {
        let mut dispatches = Vec::new();
        let mut state = self.state.lock();
        let mut still_pending = VecDeque::new();

        while let Some(job_id) = state.queue.pop_front() {
            let required = state.specs.get(&job_id).map(|s| s.required_capabilities).unwrap_or_default();
            let criteria = SelectionCriteria::requiring(required);
            match registry.select(&criteria) {
                Some(worker_id) => {
                    if let Some(job) = state.jobs.get_mut(&job_id) {
                        job.assign(worker_id.clone());
                        job.state = JobState::Running;
                    }
                    registry.update_job_count(&worker_id, 1);
                    dispatches.push(Dispatch { job_id, worker_id });
                }
                None => still_pending.push_back(job_id),
            }
        }
        state.queue = still_pending;
        dispatches
    }

    /// Transitions `Running` jobs past their deadline to `TimedOut` and
    /// re-enqueues them (up to `DEFAULT_TIMEOUT_RETRY_CAP` retries).
    /// Returns the ids that timed out this call.
    pub fn check_timeouts(&self, now_unix_ms: i64) -> Vec<JobId> {
        let mut timed_out = Vec::new();
        let mut state = self.state.lock();
        let overdue: Vec<JobId> = state
            .jobs
            .values()
            .filter(|j| j.state == JobState::Running && j.is_overdue(now_unix_ms))
            .map(|j| j.id.clone())
            .collect();

        for job_id in overdue {
            if let Some(job) = state.jobs.get_mut(&job_id) {
                job.state = JobState::TimedOut;
                job.assigned_worker = None;
                timed_out.push(job_id.clone());
                if job.has_attempts_remaining() {
                    job.state = JobState::Pending;
                    state.queue.push_back(job_id);
                }
            }
        }
        timed_out
    }

    /// Marks `job_id` `Completed`, releases its worker's slot, updates the
    /// session, and finalizes the session if every job is now terminal.
    pub fn report_job_result(&self, job_id: &JobId, result: BuildResult, registry: &WorkerRegistry, now_unix_ms: i64) -> Result<(), SchedulerError> {
        self.finish_job(job_id, JobState::Completed, Some(result), registry, now_unix_ms)
    }

    pub fn report_job_failure(&self, job_id: &JobId, result: BuildResult, registry: &WorkerRegistry, now_unix_ms: i64) -> Result<(), SchedulerError> {
        self.finish_job(job_id, JobState::Failed, Some(result), registry, now_unix_ms)
    }

    fn finish_job(
        &self,
        job_id: &JobId,
        terminal_state: JobState,
        result: Option<BuildResult>,
        registry: &WorkerRegistry,
        now_unix_ms: i64,
    ) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        let worker_id = {
            let job = state.jobs.get_mut(job_id).ok_or(SchedulerError::JobNotFound)?;
            let worker_id = job.assigned_worker.clone();
            job.state = terminal_state;
            job.result = result;
            worker_id
        };
        if let Some(worker_id) = worker_id {
            registry.update_job_count(&worker_id, -1);
            if terminal_state == JobState::Completed {
                registry.record_job_completed(&worker_id);
            } else {
                registry.record_job_failed(&worker_id);
            }
        }
        self.maybe_finalize_session(&mut state, job_id, now_unix_ms);
        Ok(())
    }

    fn maybe_finalize_session(&self, state: &mut State, job_id: &JobId, now_unix_ms: i64) {
        let session_id = match state.jobs.get(job_id) {
            Some(job) => job.session_id.clone(),
            None => return,
        };
        // Clone the session's job list once up front so the rest of this
        // function never needs to re-look-up a session it already found.
        let Some(session_job_ids) = state.sessions.get(&session_id).map(|s| s.jobs.clone()) else { return };

        let all_terminal = session_job_ids.iter().all(|id| state.jobs.get(id).map(|j| j.state.is_terminal()).unwrap_or(true));
        if !all_terminal {
            return;
        }

        let job_states: Vec<JobState> = session_job_ids.iter().filter_map(|id| state.jobs.get(id)).map(|j| j.state).collect();
        if let Some(session) = state.sessions.get_mut(&session_id) {
            if session.state != BuildSessionState::Completed
                && session.state != BuildSessionState::Failed
                && session.state != BuildSessionState::Cancelled
            {
                session.finalize(&job_states, now_unix_ms);
            }
        }
    }

    /// Any `Running` job assigned to `worker_id` returns to `Pending` at
    /// the back of the queue.
    pub fn handle_worker_disconnect(&self, worker_id: &WorkerId) {
        let mut state = self.state.lock();
        let affected: Vec<JobId> = state
            .jobs
            .values()
            .filter(|j| j.state == JobState::Running && j.assigned_worker.as_ref() == Some(worker_id))
            .map(|j| j.id.clone())
            .collect();
        for job_id in affected {
            if let Some(job) = state.jobs.get_mut(&job_id) {
                job.state = JobState::Pending;
                job.assigned_worker = None;
            }
            state.queue.push_back(job_id);
        }
    }

    /// Cancels every non-terminal job in `session_id`'s session.
    pub fn cancel_build(&self, session_id: &BuildSessionId, now_unix_ms: i64) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        let job_ids = state.sessions.get(session_id).ok_or(SchedulerError::SessionNotFound)?.jobs.clone();
        for job_id in &job_ids {
            if let Some(job) = state.jobs.get_mut(job_id) {
                if !job.state.is_terminal() {
                    job.state = JobState::Cancelled;
                }
            }
        }
        state.queue.retain(|id| !job_ids.contains(id));
        let job_states: Vec<JobState> = job_ids.iter().filter_map(|id| state.jobs.get(id)).map(|j| j.state).collect();
        if let Some(session) = state.sessions.get_mut(session_id) {
            session.finalize(&job_states, now_unix_ms);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
