// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `boe worker run` -- connects to a coordinator, completes the
//! Hello/Welcome handshake, and then alternates between sending
//! heartbeats and executing dispatched jobs until the connection drops
//! or `Ctrl-C` is received.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use boe_core::id::{IdGen, UuidIdGen};
use boe_core::now_unix_ms;
use boe_core::protocol::{ArtifactSummary, MessageType, ProtocolMessage};
use boe_daemon::protocol_wire::{read_message, write_message, WireError};
use tokio::io::BufReader;
use tokio::net::TcpStream;

pub struct WorkerRunArgs {
    pub coordinator: String,
    pub token: String,
    pub name: String,
    pub max_jobs: u32,
}

/// Strips an optional `tcp://` scheme, since the coordinator's listener
/// is a plain TCP socket and the CLI surface only promises a `<url>`
/// shape, not a particular scheme.
fn parse_addr(url: &str) -> &str {
    url.strip_prefix("tcp://").unwrap_or(url)
}

pub async fn run(args: WorkerRunArgs) -> Result<i32> {
    let addr = parse_addr(&args.coordinator);
    let stream = TcpStream::connect(addr).await.with_context(|| format!("cannot connect to coordinator at '{addr}'"))?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let id_gen = UuidIdGen;

    let (tools, capabilities) = boe_adapters::discover_all().await;
    let system_info = boe_adapters::local_system_info();
    tracing::info!(tool_count = tools.len(), ?capabilities, "discovered local toolchain");

    let hello = ProtocolMessage::new(
        id_gen.next(),
        MessageType::Hello {
            name: args.name.clone(),
            auth_token: boe_core::auth::AuthToken::new(args.token),
            system_info,
            capabilities,
        },
        now_unix_ms() / 1_000,
        None,
    )
    .context("failed to encode Hello")?;
    write_message(&mut write_half, &hello).await.context("failed to send Hello")?;

    let welcome = read_message(&mut reader).await.context("coordinator closed the connection before Welcome")?;
    let MessageType::Welcome { worker_id, heartbeat_interval_sec } = welcome.message_type else {
        bail!("expected Welcome, coordinator rejected this worker (check --token)");
    };
    tracing::info!(%worker_id, heartbeat_interval_sec, "registered with coordinator");

    let mut ticker = tokio::time::interval(Duration::from_secs(heartbeat_interval_sec.max(1)));
    ticker.tick().await; // first tick fires immediately; the handshake already counts as "alive"

    let mut active_jobs: u32 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let heartbeat = ProtocolMessage::new(
                    id_gen.next(),
                    MessageType::Heartbeat { cpu_usage: 0.0, memory_usage: 0.0, active_jobs },
                    now_unix_ms() / 1_000,
                    None,
                ).context("failed to encode Heartbeat")?;
                if write_message(&mut write_half, &heartbeat).await.is_err() {
                    tracing::warn!("lost connection to coordinator while sending heartbeat");
                    return Ok(1);
                }
            }
            incoming = read_message(&mut reader) => {
                match incoming {
                    Ok(envelope) => {
                        if let MessageType::JobRequest { invocation } = envelope.message_type {
                            active_jobs += 1;
                            let outcome = run_job(&invocation).await;
                            active_jobs = active_jobs.saturating_sub(1);
                            let reply = job_reply(&id_gen, envelope.correlation_id, outcome).context("failed to encode job result")?;
                            if write_message(&mut write_half, &reply).await.is_err() {
                                tracing::warn!("lost connection to coordinator while reporting a job result");
                                return Ok(1);
                            }
                        }
                    }
                    Err(WireError::Closed) => {
                        tracing::info!("coordinator closed the connection");
                        return Ok(0);
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "wire error reading from coordinator");
                        return Ok(1);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let disconnect = ProtocolMessage::new(
                    id_gen.next(),
                    MessageType::Disconnect { reason: Some("worker shutting down".to_string()) },
                    now_unix_ms() / 1_000,
                    None,
                ).context("failed to encode Disconnect")?;
                let _ = write_message(&mut write_half, &disconnect).await;
                return Ok(0);
            }
        }

        let _ = args.max_jobs; // capacity is currently advisory; the coordinator tracks active_jobs itself
    }
}

enum JobOutcome {
    Complete { artifacts: Vec<ArtifactSummary>, duration_sec: f64 },
    Failed { error: String, stderr_excerpt: String },
}

async fn run_job(invocation: &boe_core::protocol::JobInvocation) -> JobOutcome {
    let mut cmd = tokio::process::Command::new(&invocation.program);
    cmd.args(&invocation.args).current_dir(&invocation.working_dir);

    let started = Instant::now();
    let timeout = Duration::from_secs(invocation.timeout_sec.max(1));
    match boe_adapters::subprocess::run_with_timeout(cmd, timeout, &invocation.program).await {
        Ok(output) if output.status.success() => {
            JobOutcome::Complete { artifacts: Vec::new(), duration_sec: started.elapsed().as_secs_f64() }
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            JobOutcome::Failed {
                error: format!("job exited with {}", output.status),
                stderr_excerpt: stderr.chars().take(2_000).collect(),
            }
        }
        Err(message) => JobOutcome::Failed { error: message, stderr_excerpt: String::new() },
    }
}

fn job_reply(id_gen: &UuidIdGen, correlation_id: Option<String>, outcome: JobOutcome) -> serde_json::Result<ProtocolMessage> {
    let payload = match outcome {
        JobOutcome::Complete { artifacts, duration_sec } => MessageType::JobComplete { artifacts, duration_sec },
        JobOutcome::Failed { error, stderr_excerpt } => MessageType::JobFailed { error, stderr_excerpt },
    };
    ProtocolMessage::new(id_gen.next(), payload, now_unix_ms() / 1_000, correlation_id)
}
