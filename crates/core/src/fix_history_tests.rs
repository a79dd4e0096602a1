// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fix_action::FixKind;

fn new_entry() -> FixHistoryEntry {
    FixHistoryEntry::new("MissingLibrary:undefined reference", ErrorPatternKind::MissingLibrary, &FixKind::Retry, 0)
}

#[test]
fn untried_entry_scores_zero() {
    let entry = new_entry();
    assert_eq!(entry.score(), 0.0);
    assert_eq!(entry.success_rate(), 0.0);
    assert_eq!(entry.suggestion_score(0), 0.0);
}

#[test]
fn fresh_entry_satisfies_first_seen_equals_last_seen() {
    let entry = new_entry();
    assert_eq!(entry.first_seen_unix_ms, entry.last_seen_unix_ms);
}

#[test]
fn success_rate_reflects_recorded_outcomes() {
    let mut entry = new_entry();
    entry.record_success(100.0, 10);
    entry.record_success(100.0, 20);
    entry.record_failure(100.0, 30);
    assert_eq!(entry.total_attempts(), 3);
    assert!((entry.success_rate() - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn avg_fix_time_is_a_running_average() {
    let mut entry = new_entry();
    entry.record_success(100.0, 1);
    entry.record_success(300.0, 2);
    assert!((entry.avg_fix_time_ms - 200.0).abs() < 1e-9);
}

#[test]
fn faster_fixes_with_equal_success_rate_score_higher() {
    let mut fast = new_entry();
    fast.record_success(10.0, 1);
    let mut slow = new_entry();
    slow.record_success(10_000.0, 1);
    assert!(fast.score() > slow.score());
}

#[test]
fn last_seen_never_moves_before_first_seen() {
    let mut entry = FixHistoryEntry::new("sig", ErrorPatternKind::DiskFull, &FixKind::Retry, 5_000);
    entry.record_success(1.0, 1_000);
    assert!(entry.last_seen_unix_ms >= entry.first_seen_unix_ms);
}

#[test]
fn recency_score_decays_with_elapsed_days() {
    let mut entry = new_entry();
    entry.record_success(1.0, 0);
    let fresh = entry.recency_score(0);
    let stale = entry.recency_score(7 * 86_400_000);
    assert!(fresh > stale);
}

#[test]
fn suggestion_score_blends_success_rate_and_recency() {
    let mut entry = new_entry();
    entry.record_success(1.0, 0);
    entry.record_success(1.0, 0);
    let score = entry.suggestion_score(0);
    assert!((0.0..=1.0).contains(&score));
    assert!(score >= 0.7 * entry.success_rate());
}
