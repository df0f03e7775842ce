// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation, shared by every suspension point named in the
//! concurrency model: queue pop, module execution, and (for callers that
//! choose to honor it) blob I/O and tracking-store waits.
//!
//! A small `Arc<AtomicBool>` + `tokio::sync::Notify` pair rather than a
//! `tokio-util` dependency: the crate only needs "signal once, wake every
//! waiter", which this expresses directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A cloneable handle that can be cancelled once, from any clone, observed
/// by every other clone.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()) }
    }

    /// Signal cancellation. Idempotent; wakes every task currently awaiting
    /// [`CancellationToken::cancelled`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already cancelled; otherwise waits for the
    /// next [`CancellationToken::cancel`] call. Registers interest before
    /// re-checking the flag, so a `cancel()` racing this call is never missed.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "cancellation_tests.rs"]
mod tests;
