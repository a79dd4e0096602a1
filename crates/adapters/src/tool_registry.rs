// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovers the native build tools available on the local machine.

use crate::env::tool_probe_timeout;
use crate::subprocess::run_with_timeout;
use boe_core::worker::{Capabilities, ToolInfo};
use tokio::process::Command;

/// One tool the registry knows how to look for: its PATH name, the flag
/// that prints its version, and the capability bit it grants when found.
struct ToolProbe {
    name: &'static str,
    version_flag: &'static str,
    capability: Capabilities,
}

const PROBES: &[ToolProbe] = &[
    ToolProbe { name: "cmake", version_flag: "--version", capability: Capabilities::CMAKE },
    ToolProbe { name: "make", version_flag: "--version", capability: Capabilities::MAKE },
    ToolProbe { name: "ninja", version_flag: "--version", capability: Capabilities::NINJA },
    ToolProbe { name: "gcc", version_flag: "--version", capability: Capabilities::GCC },
    ToolProbe { name: "clang", version_flag: "--version", capability: Capabilities::CLANG },
    ToolProbe { name: "cl", version_flag: "/?", capability: Capabilities::MSVC },
    ToolProbe { name: "python3", version_flag: "--version", capability: Capabilities::PYTHON },
    ToolProbe { name: "cargo", version_flag: "--version", capability: Capabilities::RUST },
];

/// Scans `PATH` for every known build tool, probing each with its version
/// flag. Tools that aren't found or that fail to run are silently skipped
/// -- a worker with a partial toolchain is still usable for jobs that
/// don't need the missing piece.
pub async fn discover_all() -> (Vec<ToolInfo>, Capabilities) {
    let mut tools = Vec::new();
    let mut capabilities = Capabilities::empty();

    for probe in PROBES {
        let Some(path) = which(probe.name) else { continue };
        let mut cmd = Command::new(&path);
        cmd.arg(probe.version_flag);
        let Ok(output) = run_with_timeout(cmd, tool_probe_timeout(), probe.name).await else {
            continue;
        };
        let version = first_line(&output.stdout).or_else(|| first_line(&output.stderr));
        let Some(version) = version else { continue };

        tools.push(ToolInfo {
            name: probe.name.to_string(),
            version,
            path,
        });
        capabilities |= probe.capability;
    }

    (tools, capabilities)
}

/// Every package manager this crate knows how to drive, keyed by name.
/// Priority order is OS-dependent: Linux tries `apt` before `apt-get`,
/// then `dnf`, `yum`, `pacman`, `vcpkg`; macOS tries `brew` then
/// `vcpkg`; Windows tries `vcpkg`, `winget`, `choco`.
const PACKAGE_MANAGERS: &[(&str, &[&str])] = &[
    ("apt", &["install", "-y"]),
    ("apt-get", &["install", "-y"]),
    ("dnf", &["install", "-y"]),
    ("yum", &["install", "-y"]),
    ("pacman", &["-S", "--noconfirm"]),
    ("brew", &["install"]),
    ("vcpkg", &["install"]),
    ("winget", &["install"]),
    ("choco", &["install", "-y"]),
];

/// Per-OS priority order of package manager names into [`PACKAGE_MANAGERS`].
#[cfg(target_os = "linux")]
const PRIORITY: &[&str] = &["apt", "apt-get", "dnf", "yum", "pacman", "vcpkg"];
#[cfg(target_os = "macos")]
const PRIORITY: &[&str] = &["brew", "vcpkg"];
#[cfg(target_os = "windows")]
const PRIORITY: &[&str] = &["vcpkg", "winget", "choco"];
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const PRIORITY: &[&str] = &["apt", "apt-get", "dnf", "yum", "pacman", "brew", "vcpkg"];

/// Finds the highest-priority installed package manager for the current
/// OS, per [`PRIORITY`].
pub fn default_package_manager() -> Option<&'static str> {
    PRIORITY.iter().copied().find(|name| which(name).is_some())
}

/// Installs `package` with whichever package manager [`default_package_manager`]
/// finds first. Returns the raw process output so the caller (the
/// recovery engine) can decide how to fold a non-zero exit into its own
/// failure handling, same as [`crate::build_executor::execute_build`].
pub async fn package_install(package: &str, timeout: std::time::Duration) -> Result<std::process::Output, String> {
    let manager = default_package_manager().ok_or_else(|| "no supported package manager found on PATH".to_string())?;
    let Some((_, base_args)) = PACKAGE_MANAGERS.iter().find(|(name, _)| *name == manager) else {
        return Err(format!("'{manager}' has no known install arguments"));
    };
    let mut cmd = Command::new(manager);
    cmd.args(*base_args);
    cmd.arg(package);
    run_with_timeout(cmd, timeout, &format!("{manager} install {package}")).await
}

fn first_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    text.lines().next().map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
}

/// Minimal `PATH` search, avoiding a dependency on the `which` crate for a
/// one-directory-listing operation.
pub fn which(binary: &str) -> Option<String> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(binary);
        if candidate.is_file() {
            return Some(candidate.to_string_lossy().into_owned());
        }
    }
    None
}

#[cfg(test)]
#[path = "tool_registry_tests.rs"]
mod tests;
