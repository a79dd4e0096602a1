// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! boe-core: data model and shared abstractions for the build orchestrator.

pub mod auth;
pub mod build_result;
pub mod cache;
pub mod clock;
pub mod error_pattern;
pub mod fix_action;
pub mod fix_history;
pub mod id;
pub mod job;
pub mod project;
pub mod protocol;
pub mod rollback;
pub mod time_fmt;
pub mod worker;

pub use auth::{AuthChallenge, AuthOutcome, AuthToken, ChallengeId, IssuedToken, Permissions, TokenKind};
pub use build_result::BuildResult;
pub use cache::{ArtifactEntry, ArtifactType, CacheKey, CacheLookup};
pub use clock::{now_unix_ms, Clock, FakeClock, SystemClock};
pub use error_pattern::{ErrorDiagnosis, ErrorPattern, ErrorPatternKind};
pub use fix_action::{FixAction, FixKind, FixSource};
pub use fix_history::FixHistoryEntry;
pub use id::{IdGen, ShortId, SequentialIdGen, UuidIdGen};
pub use job::{
    BuildSession, BuildSessionId, BuildSessionState, DistributionStrategy, JobId, JobState,
    ScheduledJob,
};
pub use project::{DependencySpec, ProjectContext, SourceFileSummary};
pub use protocol::{ArtifactSummary, JobInvocation, MessageType, ProtocolMessage};
pub use rollback::{Backup, RollbackEntry, RollbackKind};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use worker::{Capabilities, RemoteWorker, SystemInfo, ToolInfo, WorkerId, WorkerState};
