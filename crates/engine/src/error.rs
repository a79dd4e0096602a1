// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the recovery/scheduling engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("build session not found: {0}")]
    SessionNotFound(String),
    #[error("worker not found: {0}")]
    WorkerNotFound(String),
    #[error("no worker available with required capabilities")]
    NoEligibleWorker,
    #[error("rollback failed for {path}: {message}")]
    RollbackFailed { path: String, message: String },
    #[error("fix requires confirmation and auto-apply is disabled")]
    ConfirmationRequired,
    #[error("exhausted {0} retry attempts")]
    RetriesExhausted(u32),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
