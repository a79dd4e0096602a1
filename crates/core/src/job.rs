// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Units of work dispatched to workers, and the build sessions that group them.

use crate::build_result::BuildResult;
use crate::define_id;
use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};

define_id! {
    pub struct JobId;
}

define_id! {
    pub struct BuildSessionId;
}

/// How a build session's work is split into jobs handed to workers.
///
/// `WholeProject` is the default: the whole build runs as a single job on
/// one worker. The finer-grained strategies are seams for a
/// [`JobSplitter`](crate) implementation to use once a project's build
/// graph is available; nothing in this crate requires them to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistributionStrategy {
    #[default]
    WholeProject,
    CompileUnits,
    Targets,
    Hybrid,
}

/// Lifecycle state of a single dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Assigned,
    Running,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::TimedOut | Self::Cancelled
        )
    }
}

/// One unit of work dispatched to a worker as part of a [`BuildSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: JobId,
    pub session_id: BuildSessionId,
    pub state: JobState,
    pub assigned_worker: Option<WorkerId>,
    pub attempt: u32,
    pub max_attempts: u32,
    pub created_at_unix_ms: i64,
    pub deadline_unix_ms: Option<i64>,
    pub result: Option<BuildResult>,
}

impl ScheduledJob {
    pub fn new(
        id: JobId,
        session_id: BuildSessionId,
        max_attempts: u32,
        created_at_unix_ms: i64,
        deadline_unix_ms: Option<i64>,
    ) -> Self {
        Self {
            id,
            session_id,
            state: JobState::Pending,
            assigned_worker: None,
            attempt: 0,
            max_attempts,
            created_at_unix_ms,
            deadline_unix_ms,
            result: None,
        }
    }

    pub fn assign(&mut self, worker: WorkerId) {
        self.assigned_worker = Some(worker);
        self.state = JobState::Assigned;
        self.attempt += 1;
    }

    pub fn has_attempts_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }

    pub fn is_overdue(&self, now_unix_ms: i64) -> bool {
        matches!(self.deadline_unix_ms, Some(deadline) if now_unix_ms > deadline)
    }
}

/// Lifecycle state of a whole build session (the group of jobs produced
/// from one `boe build` invocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildSessionState {
    Planning,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A build request tracked end-to-end: decomposition into jobs, dispatch,
/// and final outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSession {
    pub id: BuildSessionId,
    pub state: BuildSessionState,
    pub strategy: DistributionStrategy,
    pub jobs: Vec<JobId>,
    pub created_at_unix_ms: i64,
    pub finished_at_unix_ms: Option<i64>,
}

impl BuildSession {
    pub fn new(id: BuildSessionId, strategy: DistributionStrategy, created_at_unix_ms: i64) -> Self {
        Self {
            id,
            state: BuildSessionState::Planning,
            strategy,
            jobs: Vec::new(),
            created_at_unix_ms,
            finished_at_unix_ms: None,
        }
    }

    pub fn start(&mut self, jobs: Vec<JobId>) {
        self.jobs = jobs;
        self.state = BuildSessionState::Running;
    }

    /// Finalizes the session given the terminal state of every job in it.
    /// Any single failed/timed-out/cancelled job fails the whole session.
    pub fn finalize(&mut self, job_states: &[JobState], now_unix_ms: i64) {
        debug_assert!(job_states.iter().all(JobState::is_terminal));
        self.state = if job_states.iter().all(|s| *s == JobState::Completed) {
            BuildSessionState::Completed
        } else if job_states.iter().any(|s| *s == JobState::Cancelled) {
            BuildSessionState::Cancelled
        } else {
            BuildSessionState::Failed
        };
        self.finished_at_unix_ms = Some(now_unix_ms);
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
