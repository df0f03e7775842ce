// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named-topic publish/subscribe, implementing [`ace_core::EventSink`].
//!
//! Layered the way the teacher layers its WAL-backed `EventBus`/`EventReader`
//! pair, minus the WAL: `fire` appends to an in-memory log before invoking
//! handlers, so a future swap to a real durable log only changes the log
//! field's type, not this type's interface. Handler panics are caught at the
//! call site so one bad subscriber cannot wedge the rest.

use ace_core::{Event, EventSink};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A topic subscriber. Invoked synchronously, in registration order.
pub type Handler = Box<dyn Fn(&Event) + Send + Sync>;

/// In-process event bus. `fire` is at-least-once: a handler registered
/// before `fire` is guaranteed to observe that call.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<&'static str, Vec<Handler>>>,
    log: Mutex<Vec<Event>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` to run on every future `fire` of events whose
    /// [`Event::topic`] equals `topic`.
    pub fn register(&self, topic: &'static str, handler: Handler) {
        self.handlers.lock().entry(topic).or_default().push(handler);
    }

    /// Append `event` to the in-memory log and invoke every handler
    /// registered for its topic, swallowing handler panics.
    pub fn fire(&self, event: Event) {
        self.log.lock().push(event.clone());
        let topic = event.topic();
        let handlers = self.handlers.lock();
        if let Some(subscribers) = handlers.get(topic) {
            for handler in subscribers {
                if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                    tracing::warn!(topic, "event handler panicked, continuing");
                }
            }
        }
    }

    /// Snapshot of every event fired so far, oldest first.
    pub fn log(&self) -> Vec<Event> {
        self.log.lock().clone()
    }

    /// Clear the in-memory event log. Leaves registered handlers (including
    /// the alert-routing and content-sweep wiring `System` installs at
    /// construction) untouched, since those are infrastructure, not state
    /// a test should reset between cases.
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.log.lock().clear();
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: Event) {
        self.fire(event);
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
