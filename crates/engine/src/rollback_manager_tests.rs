// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn modify_then_rollback_restores_original_content() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("CMakeLists.txt");
    tokio::fs::write(&file, b"cmake_minimum_required(VERSION 3.10)").await.unwrap();

    let manager = RollbackManager::new(dir.path().join("sidecars"));
    let entry = manager.record_before_modify(&file).await.unwrap();

    tokio::fs::write(&file, b"cmake_minimum_required(VERSION 3.28)").await.unwrap();
    manager.rollback(&entry).await.unwrap();

    let restored = tokio::fs::read_to_string(&file).await.unwrap();
    assert_eq!(restored, "cmake_minimum_required(VERSION 3.10)");
}

#[tokio::test]
async fn delete_then_rollback_recreates_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.h");
    tokio::fs::write(&file, b"#define X 1").await.unwrap();

    let manager = RollbackManager::new(dir.path().join("sidecars"));
    let entry = manager.record_before_delete(&file).await.unwrap();
    tokio::fs::remove_file(&file).await.unwrap();

    manager.rollback(&entry).await.unwrap();
    assert!(file.exists());
}

#[tokio::test]
async fn deleting_an_already_missing_file_is_not_reversible() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("never-existed.txt");
    let manager = RollbackManager::new(dir.path().join("sidecars"));
    let entry = manager.record_before_delete(&file).await.unwrap();
    assert!(!entry.can_rollback);
}

#[tokio::test]
async fn rolling_back_a_created_file_removes_it() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("generated.txt");
    tokio::fs::write(&file, b"new").await.unwrap();

    let manager = RollbackManager::new(dir.path().join("sidecars"));
    let entry = manager.record_create(&file);
    manager.rollback(&entry).await.unwrap();
    assert!(!file.exists());
}

#[tokio::test]
async fn large_backups_spill_to_a_sidecar_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("big.o");
    let content = vec![7u8; boe_core::rollback::Backup::INLINE_THRESHOLD + 10];
    tokio::fs::write(&file, &content).await.unwrap();

    let manager = RollbackManager::new(dir.path().join("sidecars"));
    let entry = manager.record_before_modify(&file).await.unwrap();
    assert!(matches!(entry.backup, Some(boe_core::rollback::Backup::Sidecar(_))));
}

#[tokio::test]
async fn log_rollback_restores_and_disarms_the_entry() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("CMakeLists.txt");
    tokio::fs::write(&file, b"cmake_minimum_required(VERSION 3.10)").await.unwrap();

    let log = RollbackLog::new(dir.path().join("sidecars"));
    let index = log.backup_file(&file, boe_core::rollback::RollbackKind::FileModify, 1_000).await.unwrap();
    tokio::fs::write(&file, b"cmake_minimum_required(VERSION 3.28)").await.unwrap();

    log.rollback(index).await.unwrap();
    assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "cmake_minimum_required(VERSION 3.10)");

    // A second attempt is a no-op: can_rollback was flipped off above.
    tokio::fs::write(&file, b"cmake_minimum_required(VERSION 4.0)").await.unwrap();
    log.rollback(index).await.unwrap();
    assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "cmake_minimum_required(VERSION 4.0)");
}

#[tokio::test]
async fn rollback_last_walks_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    tokio::fs::write(&a, b"a-orig").await.unwrap();
    tokio::fs::write(&b, b"b-orig").await.unwrap();

    let log = RollbackLog::new(dir.path().join("sidecars"));
    log.backup_file(&a, boe_core::rollback::RollbackKind::FileModify, 1_000).await.unwrap();
    log.backup_file(&b, boe_core::rollback::RollbackKind::FileModify, 1_001).await.unwrap();
    tokio::fs::write(&a, b"a-new").await.unwrap();
    tokio::fs::write(&b, b"b-new").await.unwrap();

    log.rollback_last(2).await.unwrap();
    assert_eq!(tokio::fs::read_to_string(&a).await.unwrap(), "a-orig");
    assert_eq!(tokio::fs::read_to_string(&b).await.unwrap(), "b-orig");
}

#[tokio::test]
async fn cleanup_drops_entries_past_retention_and_removes_sidecars() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("big.o");
    let content = vec![9u8; boe_core::rollback::Backup::INLINE_THRESHOLD + 10];
    tokio::fs::write(&file, &content).await.unwrap();

    let log = RollbackLog::new(dir.path().join("sidecars"));
    log.backup_file(&file, boe_core::rollback::RollbackKind::FileModify, 0).await.unwrap();
    assert_eq!(log.len(), 1);

    let removed = log.cleanup(10_000, 1_000).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(log.len(), 0);
}
