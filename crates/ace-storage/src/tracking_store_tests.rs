// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ace_core::{NullEventSink, RequestId};

fn store() -> TrackingStore {
    TrackingStore::new(Arc::new(NullEventSink))
}

#[test]
fn save_root_rejects_stale_version() {
    let store = store();
    let root = RootAnalysis::new(RootId::new("r1"));
    let original_version = root.version;
    store.insert_root(root.clone());

    let new_version = store.save_root(root.clone(), original_version).expect("first save");
    assert_ne!(new_version, original_version);

    let err = store.save_root(root, original_version).unwrap_err();
    assert!(matches!(err, TrackingStoreError::StaleVersion { .. }));
}

#[test]
fn save_root_succeeds_with_current_version() {
    let store = store();
    let root = RootAnalysis::new(RootId::new("r1"));
    let v0 = root.version;
    store.insert_root(root.clone());

    let v1 = store.save_root(root.clone(), v0).expect("save");
    let mut reloaded = store.get_root(&root.uuid).expect("root present");
    assert_eq!(reloaded.version, v1);

    reloaded.description = Some("updated".to_string());
    let v2 = store.save_root(reloaded, v1).expect("second save");
    assert_ne!(v1, v2);
}

#[test]
fn track_request_rejects_duplicate_cache_key_while_in_flight() {
    let store = store();
    let root = RootAnalysis::new(RootId::new("r1"));
    store.insert_root(root.clone());

    let mut ar1 = AnalysisRequest::for_observable(RequestId::new("ar1"), &root, 0, "mod_a", Some("k1".to_string()));
    ar1.status = RequestStatus::Queued;
    store.track_request(ar1).expect("first track");

    let mut ar2 = AnalysisRequest::for_observable(RequestId::new("ar2"), &root, 0, "mod_a", Some("k1".to_string()));
    ar2.status = RequestStatus::Queued;
    let err = store.track_request(ar2).unwrap_err();
    assert!(matches!(err, TrackingStoreError::DuplicateCacheKey(_)));
}

#[test]
fn track_request_allows_new_cache_key_after_prior_finished() {
    let store = store();
    let root = RootAnalysis::new(RootId::new("r1"));
    store.insert_root(root.clone());

    let mut ar1 = AnalysisRequest::for_observable(RequestId::new("ar1"), &root, 0, "mod_a", Some("k1".to_string()));
    ar1.status = RequestStatus::Finished;
    store.track_request(ar1).expect("first track");

    let mut ar2 = AnalysisRequest::for_observable(RequestId::new("ar2"), &root, 0, "mod_a", Some("k1".to_string()));
    ar2.status = RequestStatus::Queued;
    store.track_request(ar2).expect("second track succeeds once prior is terminal");
}

#[test]
fn delete_request_removes_from_all_indices() {
    let store = store();
    let root = RootAnalysis::new(RootId::new("r1"));
    store.insert_root(root.clone());

    let ar = AnalysisRequest::for_observable(RequestId::new("ar1"), &root, 0, "mod_a", Some("k1".to_string()));
    let id = ar.id.clone();
    store.track_request(ar).expect("track");

    assert!(store.delete_request(&id));
    assert!(store.by_cache_key("k1").is_none());
    assert!(store.by_root(&root.uuid).is_empty());
    assert!(!store.delete_request(&id));
}

#[test]
fn linked_requests_are_returned_in_link_order() {
    let store = store();
    let src = RequestId::new("src");
    store.link_requests(&src, RequestId::new("dup1"));
    store.link_requests(&src, RequestId::new("dup2"));
    assert_eq!(store.linked(&src), vec![RequestId::new("dup1"), RequestId::new("dup2")]);
}

#[test]
fn expired_requests_only_returns_analyzing_past_deadline() {
    let store = store();
    let root = RootAnalysis::new(RootId::new("r1"));
    store.insert_root(root.clone());

    let mut ar = AnalysisRequest::for_observable(RequestId::new("ar1"), &root, 0, "mod_a", None);
    ar.status = RequestStatus::Analyzing;
    ar.deadline_epoch_ms = Some(1_000);
    store.track_request(ar).expect("track");

    assert!(store.expired_requests(999).is_empty());
    let expired = store.expired_requests(1_000);
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, RequestId::new("ar1"));
}
