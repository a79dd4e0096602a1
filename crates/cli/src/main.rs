// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! boe -- the build orchestrator's CLI front-end.
//!
//! A thin pass-through over the `boe-engine`/`boe-daemon` library APIs:
//! no REPL, no tab completion, no config-file flags beyond what's listed
//! below (a richer `cli`/`config` layer is deliberately out of scope).
//! Exactly three subcommands.

mod build_cmd;
mod coordinator_cmd;
mod project_detect;
mod worker_cmd;
mod xdg;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boe", version, about = "AI-assisted build orchestrator with a distributed execution back-end")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local recovery loop (build, diagnose, fix, retry) against a project
    Build {
        /// Project root to build
        path: PathBuf,
        /// Maximum recovery attempts before giving up
        #[arg(long, default_value_t = 5)]
        max_retries: u32,
        /// Apply fixes up to High risk automatically, without the Low-risk ceiling
        #[arg(long)]
        auto_apply: bool,
        /// Per-attempt build timeout, in seconds
        #[arg(long, default_value_t = 1_800)]
        build_timeout_sec: u64,
    },
    /// Distributed coordinator management
    #[command(subcommand)]
    Coordinator(CoordinatorCommand),
    /// Remote build worker management
    #[command(subcommand)]
    Worker(WorkerCommand),
}

#[derive(Subcommand)]
enum CoordinatorCommand {
    /// Run the coordinator service: accept worker connections and dispatch builds
    Start {
        /// Port to listen on
        #[arg(long, default_value_t = 7_420)]
        port: u16,
        /// Pre-shared token workers must present in their Hello
        #[arg(long)]
        token: Option<String>,
        /// Maintenance tick interval, in seconds
        #[arg(long, default_value_t = 30)]
        heartbeat_interval_sec: u64,
    },
}

#[derive(Subcommand)]
enum WorkerCommand {
    /// Connect to a coordinator and accept dispatched jobs until disconnected
    Run {
        /// Coordinator address, e.g. `tcp://host:7420` or `host:7420`
        #[arg(long)]
        coordinator: String,
        /// Auth token this worker presents in its Hello
        #[arg(long)]
        token: String,
        /// Name reported to the coordinator (defaults to the local hostname)
        #[arg(long)]
        name: Option<String>,
        /// Advisory concurrent job ceiling
        #[arg(long, default_value_t = 4)]
        max_jobs: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            1
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { path, max_retries, auto_apply, build_timeout_sec } => {
            build_cmd::run(build_cmd::BuildArgs { path, max_retries, auto_apply, build_timeout_sec }).await
        }
        Commands::Coordinator(CoordinatorCommand::Start { port, token, heartbeat_interval_sec }) => {
            coordinator_cmd::run(coordinator_cmd::CoordinatorStartArgs { port, token, heartbeat_interval_sec }).await
        }
        Commands::Worker(WorkerCommand::Run { coordinator, token, name, max_jobs }) => {
            let name = name.unwrap_or_else(boe_adapters::local_hostname);
            worker_cmd::run(worker_cmd::WorkerRunArgs { coordinator, token, name, max_jobs }).await
        }
    }
}
