// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use boe_core::worker::{Capabilities, SystemInfo};
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;

fn system_info() -> SystemInfo {
    SystemInfo {
        os: "linux".to_string(),
        arch: "x86_64".to_string(),
        cpu_count: 4,
        total_memory_mb: 8_192,
    }
}

async fn start_coordinator() -> (Arc<Coordinator>, SocketAddr, Arc<Notify>, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let coordinator = Arc::new(Coordinator::new(dir.path(), CacheConfig::default(), 1));
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    let shutdown = Arc::new(Notify::new());
    let running = Arc::clone(&coordinator);
    let running_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move { running.run(listener, running_shutdown).await });
    (coordinator, addr, shutdown, dir)
}

#[tokio::test]
async fn hello_with_a_trusted_token_is_welcomed_and_registered() {
    let (coordinator, addr, shutdown, _dir) = start_coordinator().await;
    let token = coordinator.trust_token("worker-secret", None);

    let stream = TcpStream::connect(addr).await.expect("connect");
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let hello = ProtocolMessage::new(
        "m1",
        MessageType::Hello {
            name: "builder-1".to_string(),
            auth_token: token,
            system_info: system_info(),
            capabilities: Capabilities::CMAKE | Capabilities::MAKE,
        },
        0,
        None,
    )
    .unwrap();
    write_message(&mut write_half, &hello).await.unwrap();

    let welcome = read_message(&mut reader).await.unwrap();
    assert!(matches!(welcome.message_type, MessageType::Welcome { .. }));

    // Registration is observable via the connection count, since worker
    // ids are minted server-side and not otherwise exposed to the test.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(coordinator.connected_worker_count(), 1);

    shutdown.notify_waiters();
}

#[tokio::test]
async fn hello_with_an_unknown_token_is_rejected() {
    let (_coordinator, addr, shutdown, _dir) = start_coordinator().await;

    let stream = TcpStream::connect(addr).await.expect("connect");
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let hello = ProtocolMessage::new(
        "m1",
        MessageType::Hello {
            name: "intruder".to_string(),
            auth_token: AuthToken::new("not-a-real-token"),
            system_info: system_info(),
            capabilities: Capabilities::empty(),
        },
        0,
        None,
    )
    .unwrap();
    write_message(&mut write_half, &hello).await.unwrap();

    // Rejected connections are closed without a Welcome; reading past
    // EOF returns 0 bytes.
    let mut line = String::new();
    let n = reader.read_line(&mut line).await.unwrap();
    assert_eq!(n, 0);

    shutdown.notify_waiters();
}
