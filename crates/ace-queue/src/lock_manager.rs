// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative advisory locks with owner + TTL.
//!
//! Secondary to the dispatcher's primary version-CAS discipline; exposed for
//! completeness and for callers that want to serialize a single
//! system-level resource such as the expired-request sweep (mirrored from
//! the original source's `ace:expired_analysis_requests` named lock).
//! `acquire` polls at a short fixed interval up to `wait_timeout` using the
//! injected clock, matching this codebase's timer-polling idiom rather than
//! pulling in a condvar-based wait for a low-contention path.

use ace_core::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Name of the system-wide lock guarding the expired-request sweep, mirrored
/// from the original source's single named system lock.
pub const EXPIRED_ANALYSIS_REQUESTS_LOCK: &str = "ace:expired_analysis_requests";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

struct LockEntry {
    owner: String,
    expires_at_epoch_ms: u64,
}

#[derive(Default)]
pub struct LockManager {
    locks: Mutex<HashMap<String, LockEntry>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_acquire<C: Clock>(&self, lock_id: &str, owner_id: &str, lock_ttl: Duration, clock: &C) -> bool {
        let now = clock.epoch_ms();
        let mut locks = self.locks.lock();
        let held = locks.get(lock_id).map(|e| e.expires_at_epoch_ms > now).unwrap_or(false);
        if held {
            return false;
        }
        locks.insert(
            lock_id.to_string(),
            LockEntry { owner: owner_id.to_string(), expires_at_epoch_ms: now + lock_ttl.as_millis() as u64 },
        );
        true
    }

    /// Acquire `lock_id` for `owner_id`, polling up to `wait_timeout`. A lock
    /// past its TTL is treated as released and may be re-acquired.
    pub async fn acquire<C: Clock>(&self, lock_id: &str, owner_id: &str, wait_timeout: Duration, lock_ttl: Duration, clock: &C) -> bool {
        let deadline = clock.now() + wait_timeout;
        loop {
            if self.try_acquire(lock_id, owner_id, lock_ttl, clock) {
                return true;
            }
            if clock.now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub fn release(&self, lock_id: &str, owner_id: &str) -> bool {
        let mut locks = self.locks.lock();
        match locks.get(lock_id) {
            Some(entry) if entry.owner == owner_id => {
                locks.remove(lock_id);
                true
            }
            _ => false,
        }
    }

    pub fn is_locked<C: Clock>(&self, lock_id: &str, clock: &C) -> bool {
        let now = clock.epoch_ms();
        self.locks.lock().get(lock_id).map(|e| e.expires_at_epoch_ms > now).unwrap_or(false)
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.locks.lock().clear();
    }
}

#[cfg(test)]
#[path = "lock_manager_tests.rs"]
mod tests;
