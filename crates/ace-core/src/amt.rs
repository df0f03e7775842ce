// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AnalysisModuleType: a registration record describing a module's contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Registration record for an analysis module.
///
/// `extended_version` is an opaque map (e.g. rule-set hashes) distinct from
/// `version`: a `version` bump is treated as a new deployment (queue drained,
/// cache purged); an `extended_version`-only change is a live, in-place
/// upgrade attempt by the worker manager (see `ace-registry`/`ace-worker`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisModuleType {
    pub name: String,
    pub description: String,
    pub observable_types: Vec<String>,
    #[serde(default)]
    pub required_directives: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// `None`/`0` means not cacheable.
    pub cache_ttl: Option<u64>,
    pub version: String,
    #[serde(default)]
    pub extended_version: BTreeMap<String, String>,
    pub timeout: Duration,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub types_produced: Vec<String>,
    /// Capability bit: run this module in an isolated OS process rather than
    /// in-task. See DESIGN NOTES "Async vs. isolated modules".
    #[serde(default)]
    pub is_multi_process: bool,
    /// Max concurrent worker tasks for this module.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    1
}

impl AnalysisModuleType {
    pub fn accepts(&self, observable_type: &str) -> bool {
        self.observable_types.iter().any(|t| t == observable_type)
    }

    pub fn is_cacheable(&self) -> bool {
        matches!(self.cache_ttl, Some(ttl) if ttl > 0)
    }

    /// Whether this AMT requires an observable to be explicitly flagged via
    /// a `manual:<name>` directive before it will run on it.
    pub fn requires_manual_directive(&self) -> bool {
        self.manual
    }
}

#[cfg(test)]
#[path = "amt_tests.rs"]
mod tests;
