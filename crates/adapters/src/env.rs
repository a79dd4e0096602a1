// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Build command timeout override (default: 1800s).
pub fn build_command_timeout() -> Duration {
    parse_duration_ms("BOE_BUILD_TIMEOUT_MS").unwrap_or(crate::subprocess::BUILD_COMMAND_TIMEOUT)
}

/// Tool discovery probe timeout override (default: 10s).
pub fn tool_probe_timeout() -> Duration {
    parse_duration_ms("BOE_TOOL_PROBE_TIMEOUT_MS").unwrap_or(crate::subprocess::TOOL_PROBE_TIMEOUT)
}

/// Package manager install timeout override (default: 300s).
pub fn package_install_timeout() -> Duration {
    parse_duration_ms("BOE_PACKAGE_INSTALL_TIMEOUT_MS")
        .unwrap_or(crate::subprocess::PACKAGE_INSTALL_TIMEOUT)
}
