// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn error_analysis_carries_no_details() {
    let a = Analysis::error("test", 0, "boom", Some("trace".to_string()));
    assert!(a.is_error());
    assert!(a.details_id.is_none());
}

#[test]
fn fresh_analysis_is_not_an_error() {
    let a = Analysis::new("test", 0);
    assert!(!a.is_error());
}
