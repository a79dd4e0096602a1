// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn assigning_a_job_increments_attempt_and_sets_worker() {
    let mut job = ScheduledJob::new(JobId::new("j1"), BuildSessionId::new("s1"), 3, 1_000, None);
    job.assign(WorkerId::new("w1"));
    assert_eq!(job.state, JobState::Assigned);
    assert_eq!(job.attempt, 1);
    assert_eq!(job.assigned_worker, Some(WorkerId::new("w1")));
    assert!(job.has_attempts_remaining());
}

#[test]
fn job_exhausts_attempts_at_the_configured_max() {
    let mut job = ScheduledJob::new(JobId::new("j1"), BuildSessionId::new("s1"), 1, 1_000, None);
    job.assign(WorkerId::new("w1"));
    assert!(!job.has_attempts_remaining());
}

#[test]
fn job_past_deadline_is_overdue() {
    let job = ScheduledJob::new(JobId::new("j1"), BuildSessionId::new("s1"), 3, 1_000, Some(2_000));
    assert!(!job.is_overdue(1_999));
    assert!(job.is_overdue(2_001));
}

#[test]
fn session_finalizes_completed_when_all_jobs_completed() {
    let mut session = BuildSession::new(BuildSessionId::new("s1"), DistributionStrategy::WholeProject, 1_000);
    session.start(vec![JobId::new("j1")]);
    session.finalize(&[JobState::Completed], 2_000);
    assert_eq!(session.state, BuildSessionState::Completed);
    assert_eq!(session.finished_at_unix_ms, Some(2_000));
}

#[test]
fn session_finalizes_failed_when_any_job_failed() {
    let mut session = BuildSession::new(BuildSessionId::new("s1"), DistributionStrategy::WholeProject, 1_000);
    session.start(vec![JobId::new("j1"), JobId::new("j2")]);
    session.finalize(&[JobState::Completed, JobState::Failed], 2_000);
    assert_eq!(session.state, BuildSessionState::Failed);
}

#[test]
fn session_finalizes_cancelled_when_a_job_was_cancelled_and_none_failed() {
    let mut session = BuildSession::new(BuildSessionId::new("s1"), DistributionStrategy::WholeProject, 1_000);
    session.start(vec![JobId::new("j1"), JobId::new("j2")]);
    session.finalize(&[JobState::Completed, JobState::Cancelled], 2_000);
    assert_eq!(session.state, BuildSessionState::Cancelled);
}

#[test]
fn default_distribution_strategy_is_whole_project() {
    assert_eq!(DistributionStrategy::default(), DistributionStrategy::WholeProject);
}
