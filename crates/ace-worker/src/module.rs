// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The collaborator contract a worker host implements: one [`AnalysisModule`]
//! per analysis module type, run by a [`crate::manager::WorkerManager`].

use ace_core::{AnalysisModuleType, ObservableIdx, RootAnalysis};
use async_trait::async_trait;
use std::fmt;

/// Raised by an [`AnalysisModule`] when it cannot produce an analysis.
///
/// Caught by the manager's module loop and turned into an
/// [`ace_core::Analysis::error`] rather than propagated, per the
/// error-handling design: a module failure completes its request
/// normally so the root it was examining isn't starved by one bad module.
#[derive(Debug, Clone)]
pub struct ModuleError {
    pub message: String,
    pub stack_trace: Option<String>,
}

impl ModuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), stack_trace: None }
    }

    pub fn with_stack_trace(message: impl Into<String>, stack_trace: impl Into<String>) -> Self {
        Self { message: message.into(), stack_trace: Some(stack_trace.into()) }
    }
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ModuleError {}

/// A single analysis module: the user-supplied logic a worker host registers
/// with a [`crate::manager::WorkerManager`].
///
/// Implementors are typically long-lived and shared across every concurrent
/// worker task for that module type (`AnalysisModuleType::limit` of them), so
/// `execute_analysis` must not assume exclusive access to `self`.
#[async_trait]
pub trait AnalysisModule: Send + Sync + 'static {
    /// The registration record this module presents to the registry. Called
    /// once at registration and again after every successful [`Self::upgrade`].
    fn analysis_module_type(&self) -> AnalysisModuleType;

    /// Produce the analysis for `observable` within `root`. Implementations
    /// read whatever of `root` they need (parent observables, prior
    /// analyses) but only the returned [`ace_core::Analysis`] is kept; it is
    /// attached to a fresh clone of `root` by the caller.
    async fn execute_analysis(&self, root: &RootAnalysis, observable: ObservableIdx) -> Result<ace_core::Analysis, ModuleError>;

    /// Attempt a live, in-place upgrade to a new `extended_version` (e.g. a
    /// refreshed rule set) without draining the work queue the way a
    /// `version` bump would. The default implementation reports that it
    /// cannot, which the manager responds to by shutting the pool down
    /// instead of looping on the same rejected poll.
    async fn upgrade(&self) -> Result<AnalysisModuleType, ModuleError> {
        Err(ModuleError::new("module does not support live upgrade"))
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
