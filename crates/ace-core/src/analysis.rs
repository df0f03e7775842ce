// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A module's output attached to an observable.

use crate::id::DetailsId;
use crate::observable::ObservableIdx;
use serde::{Deserialize, Serialize};

/// Index of an [`Analysis`] within its owning root's arena.
pub type AnalysisIdx = usize;

/// Output produced by one analysis module for one observable.
///
/// The `details` payload is opaque JSON and, per the data model, stored
/// separately by [`DetailsId`] so an in-memory `RootAnalysis` doesn't have to
/// carry large blobs around during merges — only the handle does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub amt_name: String,
    pub observable: ObservableIdx,
    pub details_id: Option<DetailsId>,
    #[serde(default)]
    pub child_observables: Vec<ObservableIdx>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub detection_points: Vec<String>,
    pub error_message: Option<String>,
    pub stack_trace: Option<String>,
}

impl Analysis {
    pub fn new(amt_name: impl Into<String>, observable: ObservableIdx) -> Self {
        Self {
            amt_name: amt_name.into(),
            observable,
            details_id: None,
            child_observables: Vec::new(),
            tags: Vec::new(),
            detection_points: Vec::new(),
            error_message: None,
            stack_trace: None,
        }
    }

    /// Build a module-error analysis: the result of a module that raised,
    /// timed out, or crashed. Per the error-handling design, this completes
    /// the request normally rather than propagating.
    pub fn error(amt_name: impl Into<String>, observable: ObservableIdx, message: impl Into<String>, stack_trace: Option<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            stack_trace,
            ..Self::new(amt_name, observable)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
