// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn add_observable_deduplicates_by_identity() {
    let mut root = RootAnalysis::new(RootId::new("r1"));
    let a = root.add_observable("ipv4", "1.2.3.4");
    let b = root.add_observable("ipv4", "1.2.3.4");
    assert_eq!(a, b);
    assert_eq!(root.observables.len(), 1);
}

#[test]
fn add_child_observable_records_relationship() {
    let mut root = RootAnalysis::new(RootId::new("r1"));
    let parent = root.add_observable("url", "http://example.com");
    let child = root.add_child_observable(parent, "fqdn", "example.com");
    assert!(root.observable(parent).children.contains(&child));
}

#[test]
fn attach_analysis_overwrites_same_module_slot() {
    let mut root = RootAnalysis::new(RootId::new("r1"));
    let obs = root.add_observable("test", "test");
    root.attach_analysis(Analysis::new("mod_a", obs));
    assert_eq!(root.analyses.len(), 1);
    root.attach_analysis(Analysis::new("mod_a", obs));
    assert_eq!(root.analyses.len(), 1);
}

#[test]
fn merge_from_empty_is_monotonic_superset() {
    let root_id = RootId::new("r1");
    let mut after = RootAnalysis::new(root_id.clone());
    let obs = after.add_observable("test", "test");
    after.attach_analysis(Analysis::new("mod_a", obs));
    after.detection_points.push("suspicious".to_string());

    let before = RootAnalysis::empty_like(root_id.clone());
    let mut target = RootAnalysis::new(root_id);

    apply_diff_merge(&mut target, &before, &after).expect("merge");

    assert_eq!(target.observables.len(), 1);
    assert_eq!(target.analyses.len(), 1);
    assert!(target.has_detections());
}

#[test]
fn merge_preserves_existing_successful_analysis_on_conflict() {
    let root_id = RootId::new("r1");
    let mut target = RootAnalysis::new(root_id.clone());
    let obs = target.add_observable("test", "test");
    target.attach_analysis(Analysis::new("mod_a", obs));

    let before = RootAnalysis::empty_like(root_id.clone());
    let mut after = RootAnalysis::new(root_id);
    let after_obs = after.add_observable("test", "test");
    after.attach_analysis(Analysis::error("mod_a", after_obs, "boom", None));

    apply_diff_merge(&mut target, &before, &after).expect("merge");

    let merged = target.get_analysis(obs, "mod_a").expect("analysis present");
    assert!(!merged.is_error(), "existing successful analysis must survive an erroring conflict");
}

#[test]
fn merge_lets_errorless_incoming_win_over_existing_error() {
    let root_id = RootId::new("r1");
    let mut target = RootAnalysis::new(root_id.clone());
    let obs = target.add_observable("test", "test");
    target.attach_analysis(Analysis::error("mod_a", obs, "boom", None));

    let before = RootAnalysis::empty_like(root_id.clone());
    let mut after = RootAnalysis::new(root_id);
    let after_obs = after.add_observable("test", "test");
    after.attach_analysis(Analysis::new("mod_a", after_obs));

    apply_diff_merge(&mut target, &before, &after).expect("merge");

    let merged = target.get_analysis(obs, "mod_a").expect("analysis present");
    assert!(!merged.is_error());
}

#[test]
fn merge_remaps_child_observable_indices_into_target_arena() {
    let root_id = RootId::new("r1");
    let before = RootAnalysis::empty_like(root_id.clone());

    let mut after = RootAnalysis::new(root_id.clone());
    let parent = after.add_observable("url", "http://example.com");
    let child = after.add_child_observable(parent, "fqdn", "example.com");
    let mut analysis = Analysis::new("mod_a", parent);
    analysis.child_observables.push(child);
    after.attach_analysis(analysis);

    // target already has an unrelated observable at index 0 so indices differ
    let mut target = RootAnalysis::new(root_id);
    target.add_observable("unrelated", "x");

    apply_diff_merge(&mut target, &before, &after).expect("merge");

    let target_parent = target.find_observable("url", "http://example.com", None).expect("parent");
    let target_child = target.find_observable("fqdn", "example.com", None).expect("child");
    assert!(target.observable(target_parent).children.contains(&target_child));

    let merged_analysis = target.get_analysis(target_parent, "mod_a").expect("analysis");
    assert_eq!(merged_analysis.child_observables, vec![target_child]);
}

#[test]
fn merge_rejects_mismatched_root_identity() {
    let mut target = RootAnalysis::new(RootId::new("r1"));
    let before = RootAnalysis::empty_like(RootId::new("r1"));
    let after = RootAnalysis::new(RootId::new("r2"));
    let err = apply_diff_merge(&mut target, &before, &after).unwrap_err();
    assert!(matches!(err, CoreError::RootMismatch { .. }));
}

#[test]
fn graft_analysis_copies_across_unrelated_roots() {
    let mut source = RootAnalysis::new(RootId::new("source"));
    let obs = source.add_observable("test", "v1");
    source.attach_analysis(Analysis::new("mod_a", obs));

    let mut target = RootAnalysis::new(RootId::new("target"));
    let grafted = graft_analysis(&mut target, &source, obs, "mod_a");

    assert!(grafted.is_some());
    let target_obs = target.find_observable("test", "v1", None).expect("observable grafted");
    assert!(target.get_analysis(target_obs, "mod_a").is_some());
}

#[test]
fn graft_analysis_remaps_child_observables_by_identity() {
    let mut source = RootAnalysis::new(RootId::new("source"));
    let parent = source.add_observable("url", "http://example.com");
    let child = source.add_child_observable(parent, "fqdn", "example.com");
    let mut analysis = Analysis::new("mod_a", parent);
    analysis.child_observables.push(child);
    source.attach_analysis(analysis);

    let mut target = RootAnalysis::new(RootId::new("target"));
    target.add_observable("unrelated", "x");
    graft_analysis(&mut target, &source, parent, "mod_a");

    let target_parent = target.find_observable("url", "http://example.com", None).expect("parent grafted");
    let target_child = target.find_observable("fqdn", "example.com", None).expect("child grafted");
    let grafted_analysis = target.get_analysis(target_parent, "mod_a").expect("analysis grafted");
    assert_eq!(grafted_analysis.child_observables, vec![target_child]);
}

#[test]
fn graft_analysis_returns_none_when_source_has_no_such_analysis() {
    let source = RootAnalysis::new(RootId::new("source"));
    let mut target = RootAnalysis::new(RootId::new("target"));
    assert!(graft_analysis(&mut target, &source, 0, "mod_a").is_none());
}
