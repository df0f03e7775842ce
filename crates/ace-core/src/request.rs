// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AnalysisRequest: the unit of scheduling between the dispatcher and workers.

use crate::id::{RequestId, RootId, WorkerId};
use crate::observable::ObservableIdx;
use crate::root::RootAnalysis;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an [`AnalysisRequest`], named after the original
/// system's `TRACKING_STATUS_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    New,
    Queued,
    Analyzing,
    Processing,
    Finished,
    Expired,
}

/// A request to either analyze a whole root (submission), analyze one
/// observable with one module (observable request), or deliver that
/// module's result (observable result).
///
/// The three entry shapes are distinguished by which of `observable`/`amt_name`/
/// `modified_root` are populated; see the dispatcher's `process_analysis_request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub id: RequestId,
    pub root: RootId,
    /// The root's version this request was created against, used to detect
    /// staleness on load.
    pub root_version: uuid::Uuid,
    pub observable: Option<ObservableIdx>,
    pub amt_name: Option<String>,
    /// `None` for a root submission or when the target AMT is not cacheable.
    pub cache_key: Option<String>,
    pub status: RequestStatus,
    pub owner: Option<WorkerId>,
    /// Epoch milliseconds after which an `Analyzing` request is considered
    /// abandoned and eligible for re-queue.
    pub deadline_epoch_ms: Option<u64>,
    /// Snapshot of the root as the worker last saw it, for diff-rebase.
    pub original_root: Option<RootAnalysis>,
    /// The worker's produced root, carrying its new analysis/observables.
    pub modified_root: Option<RootAnalysis>,
}

impl AnalysisRequest {
    /// A root-submission request: analyze the whole root end to end.
    pub fn for_root_submission(id: RequestId, root: &RootAnalysis) -> Self {
        Self {
            id,
            root: root.uuid.clone(),
            root_version: root.version,
            observable: None,
            amt_name: None,
            cache_key: None,
            status: RequestStatus::New,
            owner: None,
            deadline_epoch_ms: None,
            original_root: None,
            modified_root: None,
        }
    }

    /// An observable request: a single (observable, amt) pair waiting on a
    /// worker.
    pub fn for_observable(
        id: RequestId,
        root: &RootAnalysis,
        observable: ObservableIdx,
        amt_name: impl Into<String>,
        cache_key: Option<String>,
    ) -> Self {
        Self {
            id,
            root: root.uuid.clone(),
            root_version: root.version,
            observable: Some(observable),
            amt_name: Some(amt_name.into()),
            cache_key,
            status: RequestStatus::New,
            owner: None,
            deadline_epoch_ms: None,
            original_root: None,
            modified_root: None,
        }
    }

    pub fn is_root_submission(&self) -> bool {
        self.observable.is_none() && self.amt_name.is_none()
    }

    pub fn is_observable_result(&self) -> bool {
        self.observable.is_some() && self.amt_name.is_some() && self.modified_root.is_some()
    }

    pub fn is_expired(&self, now_epoch_ms: u64) -> bool {
        matches!(self.deadline_epoch_ms, Some(deadline) if deadline <= now_epoch_ms)
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
