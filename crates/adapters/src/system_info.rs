// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probes the local machine's hardware facts for worker registration.

use boe_core::worker::SystemInfo;
use sysinfo::System;

/// Snapshots the arch/os/cpu/memory facts a worker reports in its
/// `Hello`/`RegisterWorker` handshake.
pub fn local_system_info() -> SystemInfo {
    let mut system = System::new_all();
    system.refresh_all();
    SystemInfo {
        os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
        arch: std::env::consts::ARCH.to_string(),
        cpu_count: system.cpus().len().max(1) as u32,
        total_memory_mb: system.total_memory() / (1024 * 1024),
    }
}

/// The local machine's hostname, for worker registration and CLI defaults.
/// Falls back to `"unknown-host"` when the OS doesn't report one.
pub fn local_hostname() -> String {
    System::host_name().unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(test)]
#[path = "system_info_tests.rs"]
mod tests;
