// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ace_core::SystemClock;

#[tokio::test]
async fn acquire_then_release_allows_another_owner_in() {
    let mgr = LockManager::new();
    let clock = SystemClock;
    assert!(mgr.acquire("l1", "owner-a", Duration::from_millis(50), Duration::from_secs(5), &clock).await);
    assert!(mgr.is_locked("l1", &clock));

    assert!(mgr.release("l1", "owner-a"));
    assert!(!mgr.is_locked("l1", &clock));
    assert!(mgr.acquire("l1", "owner-b", Duration::from_millis(50), Duration::from_secs(5), &clock).await);
}

#[tokio::test]
async fn release_by_non_owner_fails() {
    let mgr = LockManager::new();
    let clock = SystemClock;
    mgr.acquire("l1", "owner-a", Duration::from_millis(50), Duration::from_secs(5), &clock).await;
    assert!(!mgr.release("l1", "owner-b"));
    assert!(mgr.is_locked("l1", &clock));
}

#[tokio::test]
async fn acquire_times_out_while_held_by_another_owner() {
    let mgr = LockManager::new();
    let clock = SystemClock;
    mgr.acquire("l1", "owner-a", Duration::from_millis(200), Duration::from_secs(5), &clock).await;
    let acquired = mgr.acquire("l1", "owner-b", Duration::from_millis(50), Duration::from_secs(5), &clock).await;
    assert!(!acquired);
}

#[tokio::test]
async fn lock_past_ttl_is_treated_as_released() {
    let mgr = LockManager::new();
    let clock = SystemClock;
    mgr.acquire("l1", "owner-a", Duration::from_millis(50), Duration::from_millis(20), &clock).await;
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(!mgr.is_locked("l1", &clock));
    assert!(mgr.acquire("l1", "owner-b", Duration::from_millis(50), Duration::from_secs(5), &clock).await);
}
