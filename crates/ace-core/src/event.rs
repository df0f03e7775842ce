// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events fired on the event bus.
//!
//! Named after the original system's `EVENT_*` constants
//! (`/core/analysis/root/new`, `/core/analysis/details/new`, ...), expressed
//! here as a tagged enum rather than string constants + untyped payloads.

use crate::id::{DetailsId, RequestId, RootId};
use serde::{Deserialize, Serialize};

/// A lifecycle event. The topic used for event-bus registration is the
/// variant's [`Event::topic`] name, not the Rust type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RootNew { root: RootId },
    RootModified { root: RootId },
    RootDeleted { root: RootId },
    DetailsNew { details: DetailsId },
    DetailsModified { details: DetailsId },
    DetailsDeleted { details: DetailsId },
    RequestNew { request: RequestId },
    RequestDeleted { request: RequestId },
    RequestExpired { request: RequestId },
    Alert { root: RootId },
}

impl Event {
    /// Stable topic name, mirroring the original `/core/analysis/...` style
    /// event names so subscribers can register on the same string across
    /// restarts without depending on Rust enum variant names.
    pub fn topic(&self) -> &'static str {
        match self {
            Event::RootNew { .. } => "root/new",
            Event::RootModified { .. } => "root/modified",
            Event::RootDeleted { .. } => "root/deleted",
            Event::DetailsNew { .. } => "details/new",
            Event::DetailsModified { .. } => "details/modified",
            Event::DetailsDeleted { .. } => "details/deleted",
            Event::RequestNew { .. } => "ar/new",
            Event::RequestDeleted { .. } => "ar/deleted",
            Event::RequestExpired { .. } => "ar/expired",
            Event::Alert { .. } => "alert",
        }
    }
}

/// Anything that can receive fired events, implemented by the event bus
/// and depended on by every crate that needs to publish without depending
/// on `ace-events` itself (avoids a dependency cycle: `ace-events` depends
/// on `ace-core`, not the other way around).
pub trait EventSink: Send + Sync {
    fn publish(&self, event: Event);
}

/// An [`EventSink`] that discards everything, for tests and standalone use
/// of `ace-storage`/`ace-registry` without wiring a real event bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: Event) {}
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
