// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::id::RequestId;

#[test]
fn root_submission_has_no_observable_or_amt() {
    let root = RootAnalysis::new(RootId::new("r1"));
    let ar = AnalysisRequest::for_root_submission(RequestId::new("ar1"), &root);
    assert!(ar.is_root_submission());
    assert!(!ar.is_observable_result());
}

#[test]
fn observable_result_requires_modified_root() {
    let root = RootAnalysis::new(RootId::new("r1"));
    let mut ar = AnalysisRequest::for_observable(RequestId::new("ar1"), &root, 0, "mod_a", None);
    assert!(!ar.is_observable_result());
    ar.modified_root = Some(root);
    assert!(ar.is_observable_result());
}

#[test]
fn deadline_expiry_is_inclusive() {
    let root = RootAnalysis::new(RootId::new("r1"));
    let mut ar = AnalysisRequest::for_observable(RequestId::new("ar1"), &root, 0, "mod_a", None);
    ar.deadline_epoch_ms = Some(1_000);
    assert!(!ar.is_expired(999));
    assert!(ar.is_expired(1_000));
    assert!(ar.is_expired(1_001));
}
