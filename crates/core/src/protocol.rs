// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire message shapes exchanged between the coordinator and its peers.
//!
//! Messages are framed one-per-line as newline-delimited JSON rather than
//! the length-prefixed framing used elsewhere in this codebase; the wire
//! format here has no prior deployment to stay compatible with, so the
//! envelope is built fresh: `{ id, type, timestamp, correlation_id,
//! payload }`.

use crate::auth::AuthToken;
use crate::cache::{ArtifactType, CacheKey};
use crate::worker::{Capabilities, SystemInfo, WorkerId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a worker needs to actually run a dispatched job: the native
/// build command, where to run it, and its own timeout. A flattened,
/// wire-friendly stand-in for the scheduler's internal `JobSpec`, which
/// carries engine-level types (`Capabilities` requirements, a `JobId`) this
/// crate doesn't need to know about once a worker has been selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout_sec: u64,
}

/// One artifact produced by a completed job, as reported in `JobComplete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub cache_key: CacheKey,
    pub size_bytes: u64,
    pub artifact_type: ArtifactType,
}

/// Every message type a coordinator connection can send or receive.
/// Serialized adjacently-tagged (`type` + `payload` keys) so it flattens
/// cleanly into [`ProtocolMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MessageType {
    /// First message on a new connection, worker→coordinator.
    Hello {
        name: String,
        auth_token: AuthToken,
        system_info: SystemInfo,
        capabilities: Capabilities,
    },
    /// Coordinator's reply to a successful `Hello`.
    Welcome {
        worker_id: WorkerId,
        heartbeat_interval_sec: u64,
    },
    /// Coordinator issuing a single-use challenge, coordinator→peer.
    AuthChallenge { nonce: String, expires_at_unix_ms: i64 },
    /// Peer's answer to an `AuthChallenge`.
    AuthResponse { response: String },
    /// Periodic liveness + load signal, worker→coordinator.
    Heartbeat {
        cpu_usage: f64,
        memory_usage: f64,
        active_jobs: u32,
    },
    /// Dynamic metrics merged into a worker's record outside a heartbeat tick.
    StatusUpdate {
        cpu_usage: f64,
        memory_usage: f64,
        network_latency_ms: f64,
    },
    /// Coordinator dispatching a job; `correlation_id` carries the job id.
    JobRequest { invocation: JobInvocation },
    /// Worker reporting partial progress on a running job.
    JobProgress { percent: f64, stage: String },
    /// Worker reporting a job's successful completion.
    JobComplete {
        artifacts: Vec<ArtifactSummary>,
        duration_sec: f64,
    },
    /// Worker reporting a job's failure.
    JobFailed { error: String, stderr_excerpt: String },
    /// Pushing an artifact's bytes to the remote cache tier (binary follows
    /// out-of-band; this message only announces it).
    ArtifactPush { cache_key: CacheKey, size: u64 },
    /// Requesting an artifact's bytes from the remote cache tier.
    ArtifactRequest { cache_key: CacheKey, size: u64 },
    /// A protocol-level error that doesn't close the connection.
    Error { message: String },
    /// Graceful connection teardown, either side.
    Disconnect { reason: Option<String> },
}

impl MessageType {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "Hello",
            Self::Welcome { .. } => "Welcome",
            Self::AuthChallenge { .. } => "AuthChallenge",
            Self::AuthResponse { .. } => "AuthResponse",
            Self::Heartbeat { .. } => "Heartbeat",
            Self::StatusUpdate { .. } => "StatusUpdate",
            Self::JobRequest { .. } => "JobRequest",
            Self::JobProgress { .. } => "JobProgress",
            Self::JobComplete { .. } => "JobComplete",
            Self::JobFailed { .. } => "JobFailed",
            Self::ArtifactPush { .. } => "ArtifactPush",
            Self::ArtifactRequest { .. } => "ArtifactRequest",
            Self::Error { .. } => "Error",
            Self::Disconnect { .. } => "Disconnect",
        }
    }
}

/// The envelope every wire message carries: a stable id, a
/// unix-seconds timestamp, an optional correlation id pairing responses to
/// requests (e.g. a `JobRequest`'s id to its eventual `JobComplete`), and
/// the typed payload. `payload_size` is computed at construction time from
/// the serialized payload rather than hand-maintained, so it can never
/// drift from the bytes actually written to the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub id: String,
    #[serde(flatten)]
    pub message_type: MessageType,
    pub timestamp: i64,
    pub correlation_id: Option<String>,
    pub payload_size: usize,
}

impl ProtocolMessage {
    /// Builds an envelope around `payload`, computing `payload_size` from
    /// the payload's own serialized bytes.
    pub fn new(
        id: impl Into<String>,
        payload: MessageType,
        timestamp: i64,
        correlation_id: Option<String>,
    ) -> serde_json::Result<Self> {
        let payload_size = serde_json::to_vec(&payload)?.len();
        Ok(Self {
            id: id.into(),
            message_type: payload,
            timestamp,
            correlation_id,
            payload_size,
        })
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
