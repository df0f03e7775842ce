// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named alert consumers subscribed to the `alert` topic.
//!
//! This is the interface-only surface for the out-of-scope GUI/alert
//! consumer: `register_alert_system(name)` hands back a handle that the
//! dispatcher's `alert` event keeps fed, `get_alerts` drains it with the same
//! bounded-wait shape `ace_queue::WorkQueue::pop` uses. One named system is a
//! dedicated FIFO of alerted roots; a root alerted with no systems
//! registered is simply dropped, matching the original source's
//! fire-and-forget alert dispatch.

use ace_core::{Event, RootId};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

struct AlertQueue {
    items: Mutex<VecDeque<RootId>>,
    notify: Notify,
}

impl AlertQueue {
    fn new() -> Self {
        Self { items: Mutex::new(VecDeque::new()), notify: Notify::new() }
    }

    /// Synchronous: called directly from [`EventBus::fire`][crate::EventBus::fire]'s
    /// handler dispatch, which is itself synchronous.
    fn push(&self, root: RootId) {
        self.items.lock().push_back(root);
        self.notify.notify_one();
    }

    async fn pop(&self, timeout: Duration) -> Option<RootId> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(root) = self.items.lock().pop_front() {
                return Some(root);
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

    fn len(&self) -> usize {
        self.items.lock().len()
    }
}

/// Registry of named alert-consumer queues, fed by the `alert` topic on an
/// [`crate::EventBus`].
#[derive(Default)]
pub struct AlertRegistry {
    systems: RwLock<HashMap<String, Arc<AlertQueue>>>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named alert consumer. Idempotent: registering an existing
    /// name returns its current queue rather than resetting it.
    pub fn register_alert_system(&self, name: impl Into<String>) {
        self.systems.write().entry(name.into()).or_insert_with(|| Arc::new(AlertQueue::new()));
    }

    /// Feed `event` to every registered alert system if it is an `Alert`.
    /// Wired as an [`crate::event_bus::Handler`] on the `alert` topic.
    pub fn handle(&self, event: &Event) {
        let Event::Alert { root } = event else { return };
        for queue in self.systems.read().values() {
            queue.push(root.clone());
        }
    }

    pub async fn get_alerts(&self, name: &str, timeout: Duration) -> Vec<RootId> {
        let Some(queue) = self.systems.read().get(name).cloned() else {
            return Vec::new();
        };
        let mut alerts = Vec::new();
        if let Some(first) = queue.pop(timeout).await {
            alerts.push(first);
        }
        while let Some(next) = queue.pop(Duration::ZERO).await {
            alerts.push(next);
        }
        alerts
    }

    pub fn get_alert_count(&self, name: &str) -> usize {
        self.systems.read().get(name).map(|queue| queue.len()).unwrap_or(0)
    }

    /// Drop every registered alert system and its queued roots. Test-only.
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.systems.write().clear();
    }
}

#[cfg(test)]
#[path = "alert_registry_tests.rs"]
mod tests;
