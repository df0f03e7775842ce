// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::at_epoch_ms(1_000);
    assert_eq!(clock.epoch_ms(), 1_000);
    let t0 = clock.now();
    clock.advance(Duration::from_millis(500));
    assert_eq!(clock.epoch_ms(), 1_500);
    assert!(clock.now() > t0);
}

#[test]
fn clones_share_state() {
    let clock = FakeClock::at_epoch_ms(0);
    let clone = clock.clone();
    clock.advance(Duration::from_secs(1));
    assert_eq!(clone.epoch_ms(), 1_000);
}
