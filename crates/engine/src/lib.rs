// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! boe-engine: the local recovery pipeline (error matching, fix planning,
//! validation, risk assessment, rollback, retry) plus the distributed
//! coordinator's worker registry and scheduler.

pub mod auth;
pub mod error;
pub mod error_matcher;
pub mod fix_planner;
pub mod recovery;
pub mod retry;
pub mod risk;
pub mod rollback_manager;
pub mod scheduler;
pub mod validator;
pub mod worker_registry;

pub use auth::{AuthManager, ChallengeError, ChallengeStore, DEFAULT_CHALLENGE_SLOTS};
pub use error::EngineError;
pub use error_matcher::ErrorMatcher;
pub use fix_planner::FixPlanner;
pub use recovery::{
    ActionApplier, BuildRunner, DefaultActionApplier, DiagnoseOracle, ProjectBuildRunner, RecoveryEngine, RecoveryOutcome, RecoveryStats,
    RecoveryStrategy,
};
pub use retry::RetryConfig;
pub use risk::{RiskAssessment, RiskAssessor, RiskLevel};
pub use rollback_manager::{RollbackLog, RollbackManager};
pub use scheduler::{Dispatch, JobSpec, JobSplitter, Scheduler, SchedulerError, WholeProject};
pub use validator::{ValidationResult, ValidationStatus, Validator};
pub use worker_registry::{SelectionCriteria, WorkerEvent, WorkerRegistry};
