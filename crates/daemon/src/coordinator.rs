// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network front-end for the distributed coordinator: a
//! `tokio::net::TcpListener` accept loop, one task per worker connection,
//! plus a background maintenance tick that drives the worker registry
//! and scheduler.
//!
//! Wire framing is newline-delimited JSON, handled by `protocol_wire`'s
//! `read_message`/`write_message`/`MAX_MESSAGE_SIZE`, since this wire
//! format has no prior deployment to stay compatible with.

use crate::protocol_wire::{read_message, write_message, WireError};
use boe_core::auth::{AuthOutcome, AuthToken};
use boe_core::build_result::BuildResult;
use boe_core::id::{IdGen, UuidIdGen};
use boe_core::job::JobId;
use boe_core::now_unix_ms;
use boe_core::protocol::{MessageType, ProtocolMessage};
use boe_core::worker::WorkerId;
use boe_engine::{AuthManager, ChallengeStore, Dispatch, Scheduler, WorkerRegistry};
use boe_storage::{ArtifactCache, CacheConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("auth rejected the connection: {0:?}")]
    AuthFailed(AuthOutcome),
    #[error("unexpected message: {0}")]
    UnexpectedMessage(&'static str),
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}

struct WorkerConnection {
    outbound: mpsc::UnboundedSender<(Option<String>, MessageType)>,
}

/// Owns every piece of coordinator-side state: the worker registry and
/// scheduler (which live in `boe-engine`), auth, and the artifact cache.
/// Hand this to [`Coordinator::run`] wrapped in an `Arc` so connection
/// tasks and the maintenance tick can share it.
pub struct Coordinator {
    pub registry: WorkerRegistry,
    pub scheduler: Scheduler,
    pub auth: AuthManager,
    pub challenges: ChallengeStore,
    pub cache: ArtifactCache,
    heartbeat_interval_sec: u64,
    connections: Mutex<HashMap<WorkerId, WorkerConnection>>,
    id_gen: UuidIdGen,
}

impl Coordinator {
    pub fn new(cache_dir: impl Into<std::path::PathBuf>, cache_config: CacheConfig, heartbeat_interval_sec: u64) -> Self {
        Self {
            registry: WorkerRegistry::default(),
            scheduler: Scheduler::new(),
            auth: AuthManager::new(),
            challenges: ChallengeStore::default(),
            cache: ArtifactCache::new(cache_dir, cache_config),
            heartbeat_interval_sec,
            connections: Mutex::new(HashMap::new()),
            id_gen: UuidIdGen,
        }
    }

    /// Pre-registers a pre-shared token (`boe coordinator start --token`)
    /// that connecting workers must present in their `Hello`.
    pub fn trust_token(&self, value: impl Into<String>, ttl_ms: Option<i64>) -> AuthToken {
        let token = AuthToken::new(value.into());
        self.auth.issue_known(token.clone(), boe_core::auth::TokenKind::Worker, now_unix_ms(), ttl_ms);
        token
    }

    pub fn connected_worker_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Runs the accept loop and the background maintenance tick until
    /// `shutdown` is notified.
    pub async fn run(self: Arc<Self>, listener: TcpListener, shutdown: Arc<Notify>) {
        let maintenance = tokio::spawn(Arc::clone(&self).maintenance_loop(shutdown.clone()));
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let this = Arc::clone(&self);
                            tokio::spawn(async move {
                                if let Err(err) = this.handle_connection(stream, addr).await {
                                    tracing::warn!(%addr, error = %err, "worker connection ended");
                                }
                            });
                        }
                        Err(err) => tracing::error!(error = %err, "accept failed"),
                    }
                }
                _ = shutdown.notified() => break,
            }
        }
        maintenance.abort();
    }

    async fn maintenance_loop(self: Arc<Self>, shutdown: Arc<Notify>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.heartbeat_interval_sec.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_maintenance_tick(),
                _ = shutdown.notified() => break,
            }
        }
    }

    /// One pass of the maintenance tick: expire overdue heartbeats,
    /// time out overdue jobs, and dispatch whatever the scheduler's
    /// queue now allows.
    fn run_maintenance_tick(&self) {
        let now = now_unix_ms();
        let disconnected = self.registry.check_heartbeats(now);
        for worker_id in &disconnected {
            self.scheduler.handle_worker_disconnect(worker_id);
            self.connections.lock().remove(worker_id);
        }
        self.scheduler.check_timeouts(now);
        for dispatch in self.scheduler.process_queue(&self.registry) {
            self.send_job(&dispatch);
        }
    }

    fn send_job(&self, dispatch: &Dispatch) {
        let Some(invocation) = self.scheduler.get_invocation(&dispatch.job_id) else { return };
        // correlation_id = job_id: the worker echoes this back on
        // JobProgress/JobComplete/JobFailed so handle_message can route the
        // result to the right ScheduledJob.
        self.send_to(
            &dispatch.worker_id,
            MessageType::JobRequest { invocation },
            Some(dispatch.job_id.as_str().to_string()),
        );
    }

    fn send_to(&self, worker_id: &WorkerId, message: MessageType, correlation_id: Option<String>) {
        if let Some(conn) = self.connections.lock().get(worker_id) {
            let _ = conn.outbound.send((correlation_id, message));
        }
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream, addr: SocketAddr) -> Result<(), CoordinatorError> {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let hello = read_message(&mut reader).await?;
        let MessageType::Hello { name, auth_token, system_info, capabilities } = hello.message_type else {
            return Err(CoordinatorError::UnexpectedMessage("expected Hello as the first message on a new connection"));
        };

        let host = addr.ip().to_string();
        let outcome = self.auth.validate_from_host(&auth_token, now_unix_ms(), Some(&host));
        if !outcome.is_success() {
            return Err(CoordinatorError::AuthFailed(outcome));
        }

        let worker_id = WorkerId::new(self.id_gen.next());
        self.registry.register(worker_id.clone(), system_info, Vec::new(), capabilities, 0, now_unix_ms());
        tracing::info!(%worker_id, %name, %addr, "worker registered");

        let (tx, mut rx) = mpsc::unbounded_channel::<(Option<String>, MessageType)>();
        self.connections.lock().insert(worker_id.clone(), WorkerConnection { outbound: tx });

        let welcome = ProtocolMessage::new(
            self.id_gen.next(),
            MessageType::Welcome { worker_id: worker_id.clone(), heartbeat_interval_sec: self.heartbeat_interval_sec },
            now_unix_ms() / 1_000,
            None,
        )
        .map_err(|_| CoordinatorError::UnexpectedMessage("failed to encode Welcome"))?;
        write_message(&mut write_half, &welcome).await?;

        let id_gen = self.id_gen.clone();
        let writer_task = tokio::spawn(async move {
            while let Some((correlation_id, payload)) = rx.recv().await {
                let Ok(envelope) = ProtocolMessage::new(id_gen.next(), payload, now_unix_ms() / 1_000, correlation_id) else {
                    continue;
                };
                if write_message(&mut write_half, &envelope).await.is_err() {
                    break;
                }
            }
        });

        let result = self.read_loop(&mut reader, &worker_id).await;

        self.connections.lock().remove(&worker_id);
        self.registry.remove(&worker_id);
        self.scheduler.handle_worker_disconnect(&worker_id);
        writer_task.abort();
        tracing::info!(%worker_id, "worker disconnected");
        result
    }

    async fn read_loop<R>(&self, reader: &mut BufReader<R>, worker_id: &WorkerId) -> Result<(), CoordinatorError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        loop {
            match read_message(reader).await {
                Ok(envelope) => self.handle_message(worker_id, envelope),
                Err(WireError::Closed) => return Ok(()),
                Err(err) => return Err(CoordinatorError::Wire(err)),
            }
        }
    }

    fn handle_message(&self, worker_id: &WorkerId, envelope: ProtocolMessage) {
        let now = now_unix_ms();
        match envelope.message_type {
            MessageType::Heartbeat { cpu_usage, memory_usage, active_jobs } => {
                self.registry.heartbeat(worker_id, now);
                tracing::trace!(%worker_id, cpu_usage, memory_usage, active_jobs, "heartbeat");
            }
            MessageType::StatusUpdate { cpu_usage, memory_usage, network_latency_ms } => {
                self.registry.heartbeat(worker_id, now);
                tracing::trace!(%worker_id, cpu_usage, memory_usage, network_latency_ms, "status update");
            }
            MessageType::JobProgress { percent, stage } => {
                tracing::debug!(%worker_id, percent, stage, "job progress");
            }
            MessageType::JobComplete { artifacts, duration_sec } => {
                if let Some(job_id) = envelope.correlation_id.map(JobId::new) {
                    let result = BuildResult::success(duration_sec, Vec::new());
                    let _ = self.scheduler.report_job_result(&job_id, result, &self.registry, now);
                }
                for artifact in artifacts {
                    tracing::debug!(%worker_id, cache_key = %artifact.cache_key, size = artifact.size_bytes, "artifact announced");
                }
            }
            MessageType::JobFailed { error, stderr_excerpt } => {
                if let Some(job_id) = envelope.correlation_id.map(JobId::new) {
                    let result = BuildResult::failure(-1, Vec::new(), stderr_excerpt.into_bytes(), 0.0);
                    let _ = self.scheduler.report_job_failure(&job_id, result, &self.registry, now);
                }
                tracing::warn!(%worker_id, %error, "job failed");
            }
            MessageType::ArtifactPush { cache_key, size } => {
                // Bytes follow out-of-band; the transport for the actual
                // payload isn't specified here, so this only records the
                // announcement. See DESIGN.md.
                tracing::debug!(%worker_id, %cache_key, size, "artifact push announced");
            }
            MessageType::ArtifactRequest { cache_key, size } => {
                tracing::debug!(%worker_id, %cache_key, size, "artifact request announced");
            }
            MessageType::Disconnect { reason } => {
                tracing::info!(%worker_id, ?reason, "worker requested disconnect");
            }
            MessageType::Error { message } => {
                tracing::warn!(%worker_id, %message, "protocol error reported by worker");
            }
            other => {
                tracing::debug!(%worker_id, kind = other.kind_name(), "message not expected on the inbound loop");
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
