// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! boed -- the distributed coordinator process.
//!
//! A standalone alternative to `boe coordinator start`, which runs the
//! same `boe-daemon::Coordinator` in-process instead. Binds a TCP
//! listener, accepts worker connections, and runs the maintenance tick
//! (heartbeat sweep, timeout sweep, queue dispatch) until `SIGINT`.

use std::path::PathBuf;
use std::sync::Arc;

use boe_daemon::Coordinator;
use boe_storage::CacheConfig;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

fn cache_dir() -> PathBuf {
    std::env::var_os("BOE_CACHE_DIR")
        .map(PathBuf::from)
        .or_else(|| dirs::cache_dir().map(|d| d.join("boe")))
        .unwrap_or_else(|| PathBuf::from(".boe-cache"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = boe_daemon::env::coordinator_port();
    let heartbeat_interval_sec = boe_daemon::env::heartbeat_interval_sec();
    let token = std::env::var("BOE_COORDINATOR_TOKEN").ok();

    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(port, error = %err, "failed to bind coordinator listener");
            std::process::exit(1);
        }
    };
    tracing::info!(port, "boed listening");

    let coordinator = Arc::new(Coordinator::new(cache_dir(), CacheConfig::default(), heartbeat_interval_sec));
    if let Some(token) = token {
        coordinator.trust_token(token, None);
        tracing::info!("pre-shared worker token registered");
    }

    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown requested");
        shutdown_signal.notify_waiters();
    });

    coordinator.run(listener, shutdown).await;
    tracing::info!("boed stopped");
}
