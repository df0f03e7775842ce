// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime knobs [`crate::system::System`] owns directly.
//!
//! Configuration loading (CLI flags, files, environment) is out of scope:
//! this is a plain struct with a `Default` impl, assembled programmatically
//! by the embedding application, not a `clap`/file-loading surface.

use std::time::Duration;

/// Tunables for [`crate::system::System`] and the [`ace_dispatcher::Dispatcher`]
/// it drives.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Upper bound on version-conflict retries before a stale root save is
    /// surfaced to the caller. Threaded into [`ace_dispatcher::Dispatcher::with_max_retries`].
    pub max_retries: u32,
    /// Default blocking wait a worker's `get_next_analysis_request` call uses
    /// when popping from an AMT's work queue.
    pub default_wait_time: Duration,
    /// TTL assigned to the expired-request sweep's advisory lock
    /// (`ace_queue::EXPIRED_ANALYSIS_REQUESTS_LOCK`), bounding how long one
    /// sweep can hold it before a concurrent caller's attempt is treated as
    /// released and retried.
    pub expired_sweep_lock_ttl: Duration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            default_wait_time: Duration::from_secs(3),
            expired_sweep_lock_ttl: Duration::from_secs(5),
        }
    }
}
