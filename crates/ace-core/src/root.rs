// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RootAnalysis: an observable-graph root.
//!
//! Per the design notes on cyclic references, the graph is represented as an
//! arena (`observables`/`analyses` flat vectors) with cross-links expressed
//! as indices, never as direct back-pointers — this keeps the type `Clone`
//! and serializable without reference-counted cycles.

use crate::analysis::{Analysis, AnalysisIdx};
use crate::error::CoreError;
use crate::id::RootId;
use crate::observable::{Observable, ObservableIdx};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An observable-graph root: the top-level container for one submission's
/// worth of analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootAnalysis {
    pub uuid: RootId,
    /// Rotated on every successful save; the optimistic-concurrency token.
    pub version: uuid::Uuid,
    pub analysis_mode: String,
    pub queue: String,
    pub description: Option<String>,
    pub analysis_cancelled: bool,
    pub cancel_reason: Option<String>,
    /// Whether this root is deleted on finalization if it produced no
    /// detections. Roots with detections are always retained regardless.
    pub expires: bool,
    /// Root-scoped detection points, distinct from any individual
    /// observable's own `detection_points`.
    pub detection_points: Vec<String>,
    pub observables: Vec<Observable>,
    pub analyses: Vec<Analysis>,
}

impl RootAnalysis {
    pub fn new(uuid: RootId) -> Self {
        Self {
            uuid,
            version: uuid::Uuid::new_v4(),
            analysis_mode: String::new(),
            queue: "default".to_string(),
            description: None,
            analysis_cancelled: false,
            cancel_reason: None,
            expires: true,
            detection_points: Vec::new(),
            observables: Vec::new(),
            analyses: Vec::new(),
        }
    }

    /// An empty root sharing `uuid`'s identity, used as the "before" side of
    /// a root-submission merge (the degenerate diff-merge form: everything in
    /// the submitted root is "new" relative to nothing).
    pub fn empty_like(uuid: RootId) -> Self {
        let mut root = Self::new(uuid);
        // Force every scalar to a value the caller's root is unlikely to
        // share by accident, so a genuinely-unset field is still "changed".
        root.analysis_mode = String::new();
        root.queue = String::new();
        root
    }

    pub fn rotate_version(&mut self) {
        self.version = uuid::Uuid::new_v4();
    }

    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.analysis_cancelled = true;
        self.cancel_reason = Some(reason.into());
    }

    pub fn find_observable(&self, otype: &str, value: &str, time: Option<&str>) -> Option<ObservableIdx> {
        self.observables
            .iter()
            .position(|o| o.otype == otype && o.value == value && o.time.as_deref() == time)
    }

    /// Add a top-level observable, deduplicating by identity.
    pub fn add_observable(&mut self, otype: impl Into<String>, value: impl Into<String>) -> ObservableIdx {
        self.add_observable_with_time(otype, value, None)
    }

    pub fn add_observable_with_time(
        &mut self,
        otype: impl Into<String>,
        value: impl Into<String>,
        time: Option<String>,
    ) -> ObservableIdx {
        let otype = otype.into();
        let value = value.into();
        if let Some(idx) = self.find_observable(&otype, &value, time.as_deref()) {
            return idx;
        }
        let mut obs = Observable::new(otype, value);
        obs.time = time;
        self.observables.push(obs);
        self.observables.len() - 1
    }

    /// Add (or find) an observable and record it as a child of `parent`.
    pub fn add_child_observable(
        &mut self,
        parent: ObservableIdx,
        otype: impl Into<String>,
        value: impl Into<String>,
    ) -> ObservableIdx {
        let child = self.add_observable(otype, value);
        let parent_obs = &mut self.observables[parent];
        if !parent_obs.children.contains(&child) {
            parent_obs.children.push(child);
        }
        child
    }

    pub fn observable(&self, idx: ObservableIdx) -> &Observable {
        &self.observables[idx]
    }

    pub fn observable_mut(&mut self, idx: ObservableIdx) -> &mut Observable {
        &mut self.observables[idx]
    }

    pub fn all_observable_indices(&self) -> impl Iterator<Item = ObservableIdx> {
        0..self.observables.len()
    }

    pub fn analysis(&self, idx: AnalysisIdx) -> &Analysis {
        &self.analyses[idx]
    }

    pub fn get_analysis_idx(&self, observable: ObservableIdx, amt_name: &str) -> Option<AnalysisIdx> {
        self.observables[observable].analyses.get(amt_name).copied()
    }

    pub fn get_analysis(&self, observable: ObservableIdx, amt_name: &str) -> Option<&Analysis> {
        self.get_analysis_idx(observable, amt_name).map(|idx| &self.analyses[idx])
    }

    /// Attach a freshly-produced analysis, overwriting any prior analysis by
    /// the same module on the same observable unconditionally. Used when a
    /// worker posts a first-time result; conflict resolution between two
    /// independently-produced analyses is [`apply_diff_merge`]'s job.
    pub fn attach_analysis(&mut self, analysis: Analysis) -> AnalysisIdx {
        let observable = analysis.observable;
        if let Some(existing) = self.get_analysis_idx(observable, &analysis.amt_name) {
            self.analyses[existing] = analysis;
            existing
        } else {
            self.analyses.push(analysis);
            let idx = self.analyses.len() - 1;
            self.observables[observable]
                .analyses
                .insert(self.analyses[idx].amt_name.clone(), idx);
            idx
        }
    }

    /// True if this root has any detection point, at the root level or on
    /// any observable it contains. Drives alert emission (§4.7 step 8).
    pub fn has_detections(&self) -> bool {
        !self.detection_points.is_empty() || self.observables.iter().any(|o| !o.detection_points.is_empty())
    }
}

/// Monotonic merge of additions from `after` (relative to `before`) onto
/// `target`. Never removes anything already in `target`.
///
/// This is the single merge primitive for the dispatcher: a root submission
/// is the degenerate case where `before` is [`RootAnalysis::empty_like`].
pub fn apply_diff_merge(target: &mut RootAnalysis, before: &RootAnalysis, after: &RootAnalysis) -> Result<(), CoreError> {
    if target.uuid != after.uuid || before.uuid != after.uuid {
        return Err(CoreError::RootMismatch {
            target: target.uuid.to_string(),
            after: after.uuid.to_string(),
        });
    }

    let mut idx_map: HashMap<ObservableIdx, ObservableIdx> = HashMap::new();
    for (after_idx, obs) in after.observables.iter().enumerate() {
        let target_idx = target.add_observable_with_time(obs.otype.clone(), obs.value.clone(), obs.time.clone());
        idx_map.insert(after_idx, target_idx);
        let target_obs = &mut target.observables[target_idx];
        for tag in &obs.tags {
            target_obs.add_tag(tag.clone());
        }
        for directive in &obs.directives {
            if !target_obs.directives.contains(directive) {
                target_obs.directives.push(directive.clone());
            }
        }
        for detection in &obs.detection_points {
            target_obs.add_detection_point(detection.clone());
        }
    }

    for (after_idx, obs) in after.observables.iter().enumerate() {
        let target_idx = idx_map[&after_idx];
        for child_after_idx in &obs.children {
            let child_target_idx = idx_map[child_after_idx];
            let target_obs = &mut target.observables[target_idx];
            if !target_obs.children.contains(&child_target_idx) {
                target_obs.children.push(child_target_idx);
            }
        }
    }

    for analysis in &after.analyses {
        let target_obs_idx = idx_map[&analysis.observable];
        let mut incoming = analysis.clone();
        incoming.observable = target_obs_idx;
        incoming.child_observables = incoming
            .child_observables
            .iter()
            .map(|idx| idx_map[idx])
            .collect();

        match target.get_analysis_idx(target_obs_idx, &incoming.amt_name) {
            None => {
                target.analyses.push(incoming);
                let new_idx = target.analyses.len() - 1;
                let amt_name = target.analyses[new_idx].amt_name.clone();
                target.observables[target_obs_idx].analyses.insert(amt_name, new_idx);
            }
            Some(existing_idx) => {
                // The incoming analysis wins only if it carries no error;
                // otherwise the existing, presumably-successful one stands.
                if !incoming.is_error() {
                    target.analyses[existing_idx] = incoming;
                }
            }
        }
    }

    for detection in &after.detection_points {
        if !target.detection_points.contains(detection) {
            target.detection_points.push(detection.clone());
        }
    }

    if after.analysis_mode != before.analysis_mode {
        target.analysis_mode = after.analysis_mode.clone();
    }
    if after.queue != before.queue {
        target.queue = after.queue.clone();
    }
    if after.description != before.description {
        target.description = after.description.clone();
    }
    if after.analysis_cancelled != before.analysis_cancelled {
        target.analysis_cancelled = after.analysis_cancelled;
        target.cancel_reason = after.cancel_reason.clone();
    }

    Ok(())
}

/// Copy the analysis `amt_name` produced for `source_obs` in `source_root`
/// onto the matching observable (found or created by identity) in `target`.
///
/// Unlike [`apply_diff_merge`], this does not require `target` and
/// `source_root` to share root identity: it is how a cached result, or a
/// result computed for a deduplicated sibling request against a different
/// root, is grafted onto a root that happens to contain the same
/// `(observable, module)` pair. Only the analysis and its child observables
/// travel; `source_obs`'s own tags/directives/detection points are not
/// copied, since those belong to the root that owns it.
pub fn graft_analysis(
    target: &mut RootAnalysis,
    source_root: &RootAnalysis,
    source_obs: ObservableIdx,
    amt_name: &str,
) -> Option<AnalysisIdx> {
    let source_analysis = source_root.get_analysis(source_obs, amt_name)?;
    let source_observable = source_root.observable(source_obs);
    let target_obs_idx = target.add_observable_with_time(
        source_observable.otype.clone(),
        source_observable.value.clone(),
        source_observable.time.clone(),
    );

    let mut grafted = source_analysis.clone();
    grafted.observable = target_obs_idx;
    grafted.child_observables = source_analysis
        .child_observables
        .iter()
        .map(|&child_idx| {
            let child = source_root.observable(child_idx);
            target.add_observable_with_time(child.otype.clone(), child.value.clone(), child.time.clone())
        })
        .collect();

    Some(target.attach_analysis(grafted))
}

#[cfg(test)]
#[path = "root_tests.rs"]
mod tests;
