// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn fresh_token_is_not_cancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn cancel_is_idempotent() {
    let token = CancellationToken::new();
    token.cancel();
    token.cancel();
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn cancelled_resolves_immediately_when_already_cancelled() {
    let token = CancellationToken::new();
    token.cancel();

    tokio::time::timeout(Duration::from_millis(50), token.cancelled())
        .await
        .expect("cancelled() must not block once the token is already cancelled");
}

#[tokio::test]
async fn cancelled_unblocks_a_waiting_clone_once_cancel_is_called() {
    let token = CancellationToken::new();
    let waiter = token.clone();

    let handle = tokio::spawn(async move {
        waiter.cancelled().await;
    });

    // Give the spawned task a chance to reach the await point before signaling.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!token.is_cancelled());
    token.cancel();

    tokio::time::timeout(Duration::from_millis(50), handle)
        .await
        .expect("cancel() must wake a task already awaiting cancelled()")
        .expect("spawned task must not panic");
}

#[tokio::test]
async fn a_second_clone_observes_cancellation_triggered_by_the_first() {
    let a = CancellationToken::new();
    let b = a.clone();

    a.cancel();

    assert!(b.is_cancelled());
    tokio::time::timeout(Duration::from_millis(50), b.cancelled())
        .await
        .expect("a clone must observe cancellation performed through another clone");
}
