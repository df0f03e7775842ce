// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory tracking store for roots, analysis-details blobs, and requests.
//!
//! Shaped after the teacher's `MaterializedState`: one mutex-guarded struct,
//! every mutation a small self-contained transition. Persistence-engine
//! selection is out of scope, so there is no WAL behind this store; each
//! method is written so that plugging one in later (replaying the same
//! transitions from a log) would not change observable behavior.

use crate::error::TrackingStoreError;
use ace_core::{AnalysisRequest, Event, EventSink, RequestId, RequestStatus, RootAnalysis, RootId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    roots: HashMap<RootId, RootAnalysis>,
    details: HashMap<String, serde_json::Value>,
    requests: HashMap<RequestId, AnalysisRequest>,
    by_cache_key: HashMap<String, RequestId>,
    by_root: HashMap<RootId, Vec<RequestId>>,
    links: HashMap<RequestId, Vec<RequestId>>,
}

/// Tracking store for roots, analysis-details blobs, and analysis requests.
///
/// Every successful mutation that the original system paired with an event
/// fires the matching [`Event`] on the injected [`EventSink`] after the
/// mutation is visible, never before and never on a no-op.
pub struct TrackingStore {
    inner: Mutex<Inner>,
    events: Arc<dyn EventSink>,
}

impl TrackingStore {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self { inner: Mutex::new(Inner::default()), events }
    }

    pub fn get_root(&self, uuid: &RootId) -> Option<RootAnalysis> {
        self.inner.lock().roots.get(uuid).cloned()
    }

    /// Insert a brand-new root (used for submissions). Fires `root/new`.
    pub fn insert_root(&self, root: RootAnalysis) {
        let uuid = root.uuid.clone();
        self.inner.lock().roots.insert(uuid.clone(), root);
        self.events.publish(Event::RootNew { root: uuid });
    }

    /// Compare-and-set save: succeeds only if the stored version equals
    /// `expected_version`. Rotates the version before storing and returns the
    /// new version. Fires `root/modified`.
    pub fn save_root(&self, mut root: RootAnalysis, expected_version: uuid::Uuid) -> Result<uuid::Uuid, TrackingStoreError> {
        let mut inner = self.inner.lock();
        let uuid = root.uuid.clone();
        match inner.roots.get(&uuid) {
            None => return Err(TrackingStoreError::UnknownRoot(uuid)),
            Some(stored) if stored.version != expected_version => {
                return Err(TrackingStoreError::StaleVersion {
                    root: uuid,
                    expected: expected_version,
                    stored: stored.version,
                });
            }
            Some(_) => {}
        }
        root.rotate_version();
        let new_version = root.version;
        inner.roots.insert(uuid.clone(), root);
        drop(inner);
        self.events.publish(Event::RootModified { root: uuid });
        Ok(new_version)
    }

    /// Remove a root entirely. Fires `root/deleted`.
    pub fn delete_root(&self, uuid: &RootId) -> Option<RootAnalysis> {
        let removed = self.inner.lock().roots.remove(uuid);
        if removed.is_some() {
            self.events.publish(Event::RootDeleted { root: uuid.clone() });
        }
        removed
    }

    pub fn get_details(&self, details_id: &str) -> Option<serde_json::Value> {
        self.inner.lock().details.get(details_id).cloned()
    }

    pub fn put_details(&self, details_id: impl Into<String>, blob: serde_json::Value) {
        self.inner.lock().details.insert(details_id.into(), blob);
    }

    /// Start tracking a freshly-created request. Rejects a second
    /// non-terminal request sharing the same `cache_key`. Fires `ar/new`.
    pub fn track_request(&self, ar: AnalysisRequest) -> Result<(), TrackingStoreError> {
        let mut inner = self.inner.lock();
        if let Some(key) = &ar.cache_key {
            if let Some(existing_id) = inner.by_cache_key.get(key) {
                if let Some(existing) = inner.requests.get(existing_id) {
                    if !is_terminal(existing.status) {
                        return Err(TrackingStoreError::DuplicateCacheKey(key.clone()));
                    }
                }
            }
            inner.by_cache_key.insert(key.clone(), ar.id.clone());
        }
        inner.by_root.entry(ar.root.clone()).or_default().push(ar.id.clone());
        let id = ar.id.clone();
        inner.requests.insert(id.clone(), ar);
        drop(inner);
        self.events.publish(Event::RequestNew { request: id });
        Ok(())
    }

    pub fn update_request(&self, ar: AnalysisRequest) {
        self.inner.lock().requests.insert(ar.id.clone(), ar);
    }

    /// Stop tracking a request (terminal completion). Fires `ar/deleted`.
    pub fn delete_request(&self, id: &RequestId) -> bool {
        let mut inner = self.inner.lock();
        let Some(ar) = inner.requests.remove(id) else {
            return false;
        };
        if let Some(key) = &ar.cache_key {
            if inner.by_cache_key.get(key) == Some(id) {
                inner.by_cache_key.remove(key);
            }
        }
        if let Some(siblings) = inner.by_root.get_mut(&ar.root) {
            siblings.retain(|r| r != id);
        }
        inner.links.remove(id);
        drop(inner);
        self.events.publish(Event::RequestDeleted { request: id.clone() });
        true
    }

    pub fn by_cache_key(&self, key: &str) -> Option<AnalysisRequest> {
        let inner = self.inner.lock();
        let id = inner.by_cache_key.get(key)?;
        inner.requests.get(id).cloned()
    }

    pub fn by_request_id(&self, id: &RequestId) -> Option<AnalysisRequest> {
        self.inner.lock().requests.get(id).cloned()
    }

    pub fn by_root(&self, uuid: &RootId) -> Vec<AnalysisRequest> {
        let inner = self.inner.lock();
        inner
            .by_root
            .get(uuid)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.requests.get(id).cloned())
            .collect()
    }

    /// Link a duplicate request (`dest`) to the in-flight one (`src`) it was
    /// deduplicated against, so a single completion can fan out to both.
    pub fn link_requests(&self, src: &RequestId, dest: RequestId) {
        self.inner.lock().links.entry(src.clone()).or_default().push(dest);
    }

    pub fn linked(&self, src: &RequestId) -> Vec<RequestId> {
        self.inner.lock().links.get(src).cloned().unwrap_or_default()
    }

    /// Requests past their deadline while still `Analyzing`. Fires
    /// `ar/expired` for each one returned.
    pub fn expired_requests(&self, now_epoch_ms: u64) -> Vec<AnalysisRequest> {
        let inner = self.inner.lock();
        let expired: Vec<AnalysisRequest> = inner
            .requests
            .values()
            .filter(|ar| ar.status == RequestStatus::Analyzing && ar.is_expired(now_epoch_ms))
            .cloned()
            .collect();
        drop(inner);
        for ar in &expired {
            self.events.publish(Event::RequestExpired { request: ar.id.clone() });
        }
        expired
    }

    /// Clear every tracked root, details blob, request, and link. Does not
    /// fire events: callers use this for test isolation between cases, not
    /// as a lifecycle transition subscribers should observe.
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        *self.inner.lock() = Inner::default();
    }
}

fn is_terminal(status: RequestStatus) -> bool {
    matches!(status, RequestStatus::Finished | RequestStatus::Expired)
}

#[cfg(test)]
#[path = "tracking_store_tests.rs"]
mod tests;
