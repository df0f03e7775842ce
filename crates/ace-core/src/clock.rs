// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable time source.
//!
//! Anything that needs "now" takes `&impl Clock` (or is generic over `C: Clock`)
//! rather than calling `Instant::now()`/`SystemTime::now()` directly, so tests can
//! advance time deterministically instead of sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A source of monotonic time and wall-clock milliseconds.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, suitable for timer/deadline arithmetic.
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch, suitable for persisted timestamps.
    fn epoch_ms(&self) -> u64;
}

/// Production clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic clock for tests. Starts at a fixed origin and only moves
/// when [`FakeClock::advance`] is called.
#[derive(Clone, Debug)]
pub struct FakeClock {
    origin: Instant,
    epoch_origin_ms: u64,
    elapsed_ms: Arc<AtomicU64>,
}

impl FakeClock {
    /// Create a clock starting "now" (by wall clock, for readable epoch_ms in test output).
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            epoch_origin_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            elapsed_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a clock starting at a fixed, arbitrary epoch (for reproducible expectations).
    pub fn at_epoch_ms(epoch_origin_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            epoch_origin_ms,
            elapsed_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the clock by `delta`. Monotonic: never moves backwards.
    pub fn advance(&self, delta: Duration) {
        self.elapsed_ms
            .fetch_add(delta.as_millis() as u64, Ordering::SeqCst);
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_origin_ms + self.elapsed_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
