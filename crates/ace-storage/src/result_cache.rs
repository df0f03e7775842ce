// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed cache of completed observable analyses.
//!
//! Cache keys are computed the same way the teacher hashes runbook content
//! for `refresh_worker_runbook`: a canonical newline-joined field list run
//! through `Sha256`, hex-encoded. Expiry is an absolute instant taken from
//! the injected `Clock` rather than wall-clock time, so tests can advance it
//! deterministically instead of sleeping.

use ace_core::{AnalysisModuleType, AnalysisRequest, Observable};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

struct Entry {
    ar: AnalysisRequest,
    amt_name: String,
    expires_at_epoch_ms: u64,
}

/// Cache of completed analyses, keyed by [`cache_key`].
#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, Entry>>,
}

/// Compute the cache key for `(observable, amt)`, or `None` if the module
/// isn't cacheable.
///
/// Formula: `sha256(type \n value \n time-or-empty \n amt.name \n amt.version \n
/// sorted "key=value" extended_version pairs, one per line)`, hex lowercase.
pub fn cache_key(observable: &Observable, amt: &AnalysisModuleType) -> Option<String> {
    if !amt.is_cacheable() {
        return None;
    }
    let mut hasher = Sha256::new();
    hasher.update(observable.otype.as_bytes());
    hasher.update(b"\n");
    hasher.update(observable.value.as_bytes());
    hasher.update(b"\n");
    hasher.update(observable.time.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"\n");
    hasher.update(amt.name.as_bytes());
    hasher.update(b"\n");
    hasher.update(amt.version.as_bytes());
    for (k, v) in &amt.extended_version {
        hasher.update(b"\n");
        hasher.update(format!("{k}={v}").as_bytes());
    }
    Some(format!("{:x}", hasher.finalize()))
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result if present and not expired as of
    /// `now_epoch_ms`; an expired entry is deleted and treated as absent.
    pub fn get(&self, key: &str, now_epoch_ms: u64) -> Option<AnalysisRequest> {
        let mut entries = self.entries.lock();
        let expired = entries.get(key).map(|e| e.expires_at_epoch_ms <= now_epoch_ms).unwrap_or(false);
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| e.ar.clone())
    }

    /// Store a completed result under `key` with an absolute TTL in seconds
    /// from `now_epoch_ms`.
    pub fn put(&self, key: impl Into<String>, ar: AnalysisRequest, amt_name: impl Into<String>, ttl_secs: u64, now_epoch_ms: u64) {
        let expires_at_epoch_ms = now_epoch_ms.saturating_add(ttl_secs.saturating_mul(1000));
        self.entries.lock().insert(key.into(), Entry { ar, amt_name: amt_name.into(), expires_at_epoch_ms });
    }

    pub fn delete_expired(&self, now_epoch_ms: u64) {
        self.entries.lock().retain(|_, e| e.expires_at_epoch_ms > now_epoch_ms);
    }

    pub fn delete_by_amt(&self, amt_name: &str) {
        self.entries.lock().retain(|_, e| e.amt_name != amt_name);
    }

    pub fn size(&self, amt_name: Option<&str>) -> usize {
        let entries = self.entries.lock();
        match amt_name {
            None => entries.len(),
            Some(name) => entries.values().filter(|e| e.amt_name == name).count(),
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
#[path = "result_cache_tests.rs"]
mod tests;
