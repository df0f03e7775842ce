// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-module FIFO work queues.
//!
//! Each queue pairs a `tokio::sync::Mutex<VecDeque<_>>` with a
//! `tokio::sync::Notify` for wake-on-push, the same "bounded-wait pop, none
//! on elapse" shape used for blocking reads elsewhere in this codebase,
//! generalized here from one shared structure to a per-AMT registry.

use ace_core::AnalysisRequest;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// A single AMT's FIFO of pending requests.
pub struct WorkQueue {
    items: Mutex<VecDeque<AnalysisRequest>>,
    notify: Notify,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self { items: Mutex::new(VecDeque::new()), notify: Notify::new() }
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, ar: AnalysisRequest) {
        self.items.lock().await.push_back(ar);
        self.notify.notify_one();
    }

    /// Pop the oldest request, waiting up to `timeout` for one to arrive.
    /// Returns `None` on elapse; a single consumer receives each item.
    pub async fn pop(&self, timeout: Duration) -> Option<AnalysisRequest> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(ar) = self.items.lock().await.pop_front() {
                return Some(ar);
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let notified = self.notify.notified();
            if tokio::time::timeout(remaining, notified).await.is_err() {
                return None;
            }
        }
    }

    pub async fn size(&self) -> usize {
        self.items.lock().await.len()
    }
}

/// Registry of one [`WorkQueue`] per AMT name. Queue lifetime is tied 1:1 to
/// AMT registration: created on `add_work_queue`, torn down on
/// `invalidate_work_queue` (a version bump drains and recreates the queue).
#[derive(Default)]
pub struct WorkQueueRegistry {
    queues: RwLock<HashMap<String, Arc<WorkQueue>>>,
}

impl WorkQueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_work_queue(&self, amt_name: impl Into<String>) -> Arc<WorkQueue> {
        let amt_name = amt_name.into();
        self.queues.write().entry(amt_name).or_insert_with(|| Arc::new(WorkQueue::new())).clone()
    }

    pub fn get_work_queue(&self, amt_name: &str) -> Option<Arc<WorkQueue>> {
        self.queues.read().get(amt_name).cloned()
    }

    /// Drop the existing queue (discarding any still-pending requests) and
    /// install a fresh, empty one under the same name.
    pub fn invalidate_work_queue(&self, amt_name: &str) {
        self.queues.write().insert(amt_name.to_string(), Arc::new(WorkQueue::new()));
    }

    pub fn remove_work_queue(&self, amt_name: &str) {
        self.queues.write().remove(amt_name);
    }

    pub fn reset(&self) {
        self.queues.write().clear();
    }
}

#[cfg(test)]
#[path = "work_queue_tests.rs"]
mod tests;
