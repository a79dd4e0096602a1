// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

/// Maintenance tick interval override (default: 30s), matching the
/// `heartbeat_interval_sec` the coordinator hands workers in `Welcome`.
pub fn heartbeat_interval_sec() -> u64 {
    std::env::var("BOE_HEARTBEAT_INTERVAL_SEC")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
}

/// Coordinator bind port override (default: 7420).
pub fn coordinator_port() -> u16 {
    std::env::var("BOE_COORDINATOR_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(7420)
}
