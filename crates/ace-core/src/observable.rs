// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The observable type: a typed value inside a [`crate::root::RootAnalysis`].

use serde::{Deserialize, Serialize};

/// Index of an [`Observable`] within its owning root's arena.
pub type ObservableIdx = usize;

/// Prefix that marks a directive as gating a specific manual-only module.
///
/// `manual:virustotal` means "only run the `virustotal` module on this
/// observable if it is explicitly requested", per the module registry's
/// `manual` flag handling.
pub const MANUAL_DIRECTIVE_PREFIX: &str = "manual:";

/// A typed value to be analyzed (a URL, a file hash, an IP, ...).
///
/// Identity is `(type, value, time)`: two observables with the same triple
/// are the same observable and are deduplicated within a root by
/// [`crate::root::RootAnalysis::add_observable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observable {
    #[serde(rename = "type")]
    pub otype: String,
    pub value: String,
    pub time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub directives: Vec<String>,
    #[serde(default)]
    pub detection_points: Vec<String>,
    /// Indices (into the owning root's observable arena) of observables
    /// discovered as children of this one by some analysis.
    #[serde(default)]
    pub children: Vec<ObservableIdx>,
    /// `amt name -> index into the owning root's analysis arena`.
    #[serde(default)]
    pub analyses: std::collections::BTreeMap<String, usize>,
}

impl Observable {
    pub fn new(otype: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            otype: otype.into(),
            value: value.into(),
            time: None,
            tags: Vec::new(),
            directives: Vec::new(),
            detection_points: Vec::new(),
            children: Vec::new(),
            analyses: std::collections::BTreeMap::new(),
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn identity(&self) -> (&str, &str, Option<&str>) {
        (self.otype.as_str(), self.value.as_str(), self.time.as_deref())
    }

    /// True if a directive requires module `name` to be explicitly requested.
    pub fn requests_manual_module(&self, name: &str) -> bool {
        let wanted = format!("{MANUAL_DIRECTIVE_PREFIX}{name}");
        self.directives.iter().any(|d| d == &wanted)
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn add_detection_point(&mut self, detection: impl Into<String>) {
        let detection = detection.into();
        if !self.detection_points.contains(&detection) {
            self.detection_points.push(detection);
        }
    }

    pub fn has_analysis(&self, amt_name: &str) -> bool {
        self.analyses.contains_key(amt_name)
    }
}

#[cfg(test)]
#[path = "observable_tests.rs"]
mod tests;
