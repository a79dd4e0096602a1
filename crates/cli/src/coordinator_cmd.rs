// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `boe coordinator start` -- runs the distributed coordinator in this
//! process: binds a TCP listener, runs the accept loop and maintenance
//! tick until `Ctrl-C`.

use std::sync::Arc;

use anyhow::{Context, Result};
use boe_daemon::Coordinator;
use boe_storage::CacheConfig;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::xdg;

pub struct CoordinatorStartArgs {
    pub port: u16,
    pub token: Option<String>,
    pub heartbeat_interval_sec: u64,
}

pub async fn run(args: CoordinatorStartArgs) -> Result<i32> {
    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("cannot bind coordinator listener on port {}", args.port))?;
    let addr = listener.local_addr().context("listener has no local address")?;

    let coordinator = Arc::new(Coordinator::new(xdg::cache_dir(), CacheConfig::default(), args.heartbeat_interval_sec));
    if let Some(token) = args.token {
        coordinator.trust_token(token, None);
        tracing::info!("pre-shared worker token registered");
    }

    tracing::info!(%addr, "coordinator listening");

    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown requested");
        shutdown_signal.notify_waiters();
    });

    coordinator.run(listener, shutdown).await;
    Ok(0)
}
