// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote build workers tracked by the coordinator's worker registry.

use crate::define_id;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

define_id! {
    pub struct WorkerId;
}

bitflags! {
    /// What a worker's toolchain can do, as a compact bitmask so the
    /// scheduler can filter candidates with a single `&` instead of
    /// walking a `Vec<String>` of tool names per job.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Capabilities: u32 {
        const CMAKE      = 0b0000_0001;
        const MAKE       = 0b0000_0010;
        const NINJA      = 0b0000_0100;
        const GCC        = 0b0000_1000;
        const CLANG      = 0b0001_0000;
        const MSVC       = 0b0010_0000;
        const PYTHON     = 0b0100_0000;
        const RUST       = 0b1000_0000;
    }
}

/// Static facts about a worker's host, reported at registration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu_count: u32,
    pub total_memory_mb: u64,
}

/// One discovered build tool and the version string reported by probing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub path: String,
}

/// Lifecycle state of a registered worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    Offline,
    Connecting,
    Online,
    Busy,
    Draining,
    Error,
}

impl WorkerState {
    /// Whether the scheduler may hand this worker new work.
    pub fn accepts_jobs(&self) -> bool {
        matches!(self, Self::Online)
    }
}

/// A worker the coordinator has registered and is tracking health for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWorker {
    pub id: WorkerId,
    pub state: WorkerState,
    pub system_info: SystemInfo,
    pub tools: Vec<ToolInfo>,
    pub capabilities: Capabilities,
    pub max_concurrent_jobs: u32,
    pub running_jobs: u32,
    pub last_heartbeat_unix_ms: i64,
    pub consecutive_missed_heartbeats: u32,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
}

impl RemoteWorker {
    pub fn new(
        id: WorkerId,
        system_info: SystemInfo,
        tools: Vec<ToolInfo>,
        capabilities: Capabilities,
        max_concurrent_jobs: u32,
        now_unix_ms: i64,
    ) -> Self {
        Self {
            id,
            state: WorkerState::Connecting,
            system_info,
            tools,
            capabilities,
            max_concurrent_jobs,
            running_jobs: 0,
            last_heartbeat_unix_ms: now_unix_ms,
            consecutive_missed_heartbeats: 0,
            jobs_completed: 0,
            jobs_failed: 0,
        }
    }

    pub fn has_spare_capacity(&self) -> bool {
        self.state.accepts_jobs() && self.running_jobs < self.max_concurrent_jobs
    }

    pub fn record_heartbeat(&mut self, now_unix_ms: i64) {
        self.last_heartbeat_unix_ms = now_unix_ms;
        self.consecutive_missed_heartbeats = 0;
        if self.state == WorkerState::Connecting {
            self.state = WorkerState::Online;
        }
    }

    pub fn record_missed_heartbeat(&mut self) {
        self.consecutive_missed_heartbeats += 1;
    }

    /// Score in `0.0..=1.0` used to rank workers when several can take a
    /// job: rewards low load, a clean success history, and recent contact.
    pub fn health_score(&self) -> f64 {
        if !self.state.accepts_jobs() {
            return 0.0;
        }
        let load_factor = if self.max_concurrent_jobs == 0 {
            0.0
        } else {
            1.0 - f64::from(self.running_jobs) / f64::from(self.max_concurrent_jobs)
        };
        let total_jobs = self.jobs_completed + self.jobs_failed;
        let success_factor = if total_jobs == 0 {
            1.0
        } else {
            self.jobs_completed as f64 / total_jobs as f64
        };
        let heartbeat_penalty = 1.0 / (1.0 + f64::from(self.consecutive_missed_heartbeats));
        (load_factor * 0.4 + success_factor * 0.4 + heartbeat_penalty * 0.2).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
