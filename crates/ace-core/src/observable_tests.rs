// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn identity_includes_time() {
    let a = Observable::new("ipv4", "1.2.3.4");
    let b = Observable::new("ipv4", "1.2.3.4").with_time("2026-01-01T00:00:00");
    assert_ne!(a.identity(), b.identity());
}

#[test]
fn manual_directive_matches_only_named_module() {
    let mut obs = Observable::new("test", "test");
    obs.directives.push("manual:virustotal".to_string());
    assert!(obs.requests_manual_module("virustotal"));
    assert!(!obs.requests_manual_module("other_module"));
}

#[test]
fn add_tag_deduplicates() {
    let mut obs = Observable::new("test", "test");
    obs.add_tag("suspicious");
    obs.add_tag("suspicious");
    assert_eq!(obs.tags, vec!["suspicious".to_string()]);
}
