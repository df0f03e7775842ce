// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher state machine: `process_analysis_request` decomposes a
//! root submission or worker result into per-(observable, module) requests,
//! merges results back under optimistic concurrency, and emits alerts.
//!
//! A single pass is [`Dispatcher::try_process`]; [`Dispatcher::process_analysis_request`]
//! wraps it in the version-conflict retry loop and the delete-then-fan-out
//! tail described in the design notes' resolved Open Question (a).

use crate::error::DispatcherError;
use ace_core::{
    graft_analysis, AnalysisRequest, Clock, Event, EventSink, IdGen, ObservableIdx, RequestId,
    RequestStatus, RootAnalysis, RootId,
};
use ace_queue::WorkQueueRegistry;
use ace_registry::Registry;
use ace_storage::{cache_key, ResultCache, TrackingStore, TrackingStoreError};
use std::collections::VecDeque;
use std::sync::Arc;

/// Upper bound on version-conflict retries before a stale save is surfaced
/// to the caller, per the design notes' "typically <= N=8" figure.
const MAX_RETRIES: u32 = 8;

fn is_terminal(status: RequestStatus) -> bool {
    matches!(status, RequestStatus::Finished | RequestStatus::Expired)
}

/// Drives analysis requests through expansion, merge, and finalization.
///
/// Generic over [`Clock`] (deadline/TTL arithmetic) and [`IdGen`] (minting
/// ids for newly-created observable requests), matching the pattern used
/// throughout this codebase for deterministic test doubles.
pub struct Dispatcher<C: Clock, G: IdGen> {
    store: Arc<TrackingStore>,
    cache: Arc<ResultCache>,
    queues: Arc<WorkQueueRegistry>,
    registry: Arc<Registry>,
    events: Arc<dyn EventSink>,
    clock: C,
    id_gen: G,
    max_retries: u32,
}

impl<C: Clock, G: IdGen> Dispatcher<C, G> {
    pub fn new(
        store: Arc<TrackingStore>,
        cache: Arc<ResultCache>,
        queues: Arc<WorkQueueRegistry>,
        registry: Arc<Registry>,
        events: Arc<dyn EventSink>,
        clock: C,
        id_gen: G,
    ) -> Self {
        Self { store, cache, queues, registry, events, clock, id_gen, max_retries: MAX_RETRIES }
    }

    /// Override the version-conflict retry bound (default [`MAX_RETRIES`]).
    /// Exposed for `ace-system`'s `SystemConfig`, which owns this knob.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Drive `ar` to completion: rebase, expand, save, then delete and fan
    /// out to every cache-key-linked duplicate, then finalize.
    #[tracing::instrument(skip(self, ar), fields(ar_id = %ar.id, root_uuid = %ar.root, amt_name = ar.amt_name.as_deref()))]
    pub async fn process_analysis_request(&self, ar: AnalysisRequest) -> Result<(), DispatcherError> {
        let mut attempts = 0;
        loop {
            match self.try_process(&ar).await {
                Ok(()) => break,
                Err(DispatcherError::Storage(TrackingStoreError::StaleVersion { .. })) if attempts < self.max_retries => {
                    attempts += 1;
                    tracing::debug!(request = %ar.id, root = %ar.root, attempts, "stale root version, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        self.store.delete_request(&ar.id);

        for dup_id in self.store.linked(&ar.id) {
            let Some(dup) = self.store.by_request_id(&dup_id) else {
                continue;
            };
            let fanned = fan_out_result(&dup, &ar);
            Box::pin(self.process_analysis_request(fanned)).await?;
        }

        self.finalize(&ar.root).await?;
        Ok(())
    }

    /// Steps 1-6: rebase, cancellation check, cache deposit, expand, save.
    #[tracing::instrument(skip(self, ar), fields(ar_id = %ar.id, root_uuid = %ar.root, cache_key = ar.cache_key.as_deref()))]
    async fn try_process(&self, ar: &AnalysisRequest) -> Result<(), DispatcherError> {
        let Some(mut target) = self.store.get_root(&ar.root) else {
            return Err(TrackingStoreError::UnknownRoot(ar.root.clone()).into());
        };
        let expected_version = target.version;

        self.rebase(&mut target, ar)?;

        if !target.analysis_cancelled {
            self.deposit_cache(&mut target, ar)?;
            self.expand(&mut target, ar).await?;
        }

        self.store.save_root(target, expected_version)?;
        Ok(())
    }

    /// Step 1: apply `ar`'s result onto `target`. A result against `target`'s
    /// own root (the normal worker-completion path, or this same root's
    /// stale-version retry) is rebased with `apply_diff_merge`. A result
    /// fanned out from a cache-key-linked duplicate (§4.7 step 7) carries a
    /// `modified_root` that belongs to a *different* root entirely, so it is
    /// grafted onto `target` with `graft_analysis` instead — `apply_diff_merge`
    /// would reject it outright on root-identity mismatch.
    fn rebase(&self, target: &mut RootAnalysis, ar: &AnalysisRequest) -> Result<(), DispatcherError> {
        let (Some(before), Some(after)) = (&ar.original_root, &ar.modified_root) else {
            return Ok(());
        };
        if after.uuid == target.uuid {
            ace_core::apply_diff_merge(target, before, after)?;
        } else if let (Some(source_obs), Some(amt_name)) = (ar.observable, ar.amt_name.as_deref()) {
            graft_analysis(target, after, source_obs, amt_name);
        }
        Ok(())
    }

    /// Step 3: if `ar` is a completed observable result for a cacheable,
    /// errorless analysis, deposit it into the result cache.
    fn deposit_cache(&self, target: &mut RootAnalysis, ar: &AnalysisRequest) -> Result<(), DispatcherError> {
        if !ar.is_observable_result() {
            return Ok(());
        }
        let amt_name = ar
            .amt_name
            .as_deref()
            .ok_or_else(|| DispatcherError::MalformedObservableResult { request: ar.id.clone(), field: "amt_name" })?;
        let Some(amt) = self.registry.get(amt_name) else {
            return Ok(());
        };
        if !amt.is_cacheable() {
            return Ok(());
        }
        let modified_root = ar
            .modified_root
            .as_ref()
            .ok_or_else(|| DispatcherError::MalformedObservableResult { request: ar.id.clone(), field: "modified_root" })?;
        let source_obs_idx = ar
            .observable
            .ok_or_else(|| DispatcherError::MalformedObservableResult { request: ar.id.clone(), field: "observable" })?;
        let source_obs = modified_root.observable(source_obs_idx);

        let Some(target_obs_idx) = target.find_observable(&source_obs.otype, &source_obs.value, source_obs.time.as_deref()) else {
            return Ok(());
        };
        let Some(analysis) = target.get_analysis(target_obs_idx, amt_name) else {
            return Ok(());
        };
        if analysis.is_error() {
            return Ok(());
        }
        if let Some(key) = cache_key(target.observable(target_obs_idx), &amt) {
            let ttl = amt.cache_ttl.unwrap_or(0);
            self.cache.put(key, ar.clone(), amt_name, ttl, self.clock.epoch_ms());
        }
        Ok(())
    }

    /// Steps 4-5: enumerate candidate (observable, amt) pairs and either
    /// graft a cached result, link to an in-flight duplicate, or enqueue.
    async fn expand(&self, target: &mut RootAnalysis, ar: &AnalysisRequest) -> Result<(), DispatcherError> {
        let mut worklist = self.seed_worklist(target, ar)?;

        while let Some(obs_idx) = worklist.pop_front() {
            if obs_idx >= target.observables.len() {
                continue;
            }
            for amt in self.registry.list() {
                let observable = target.observable(obs_idx).clone();
                if !amt.accepts(&observable.otype) {
                    continue;
                }
                if amt.requires_manual_directive() && !observable.requests_manual_module(&amt.name) {
                    continue;
                }
                if observable.has_analysis(&amt.name) {
                    continue;
                }
                if !amt.dependencies.iter().all(|dep| observable.has_analysis(dep)) {
                    continue;
                }
                if self.has_pending(&target.uuid, obs_idx, &amt.name) {
                    continue;
                }

                let key = cache_key(&observable, &amt);

                if let Some(key) = &key {
                    if let Some(cached) = self.cache.get(key, self.clock.epoch_ms()) {
                        if let Some(grafted) = self.graft_cached(target, &cached, &amt.name) {
                            let analysis = target.analysis(grafted);
                            worklist.extend(analysis.child_observables.iter().copied());
                            worklist.push_back(obs_idx);
                        }
                        continue;
                    }
                    if let Some(existing) = self.store.by_cache_key(key) {
                        if !is_terminal(existing.status) {
                            let new_id = RequestId::new(self.id_gen.next());
                            let new_ar = AnalysisRequest::for_observable(new_id.clone(), target, obs_idx, amt.name.clone(), Some(key.clone()));
                            self.store.track_request(new_ar)?;
                            self.store.link_requests(&existing.id, new_id);
                            continue;
                        }
                    }
                }

                let id = RequestId::new(self.id_gen.next());
                let deadline = self.clock.epoch_ms().saturating_add(amt.timeout.as_millis() as u64);
                let mut new_ar = AnalysisRequest::for_observable(id, target, obs_idx, amt.name.clone(), key);
                new_ar.status = RequestStatus::Queued;
                new_ar.deadline_epoch_ms = Some(deadline);
                self.store.track_request(new_ar.clone())?;
                if let Some(queue) = self.queues.get_work_queue(&amt.name) {
                    queue.put(new_ar).await;
                }
            }
        }

        Ok(())
    }

    /// `ar.observables`: every observable for a root submission; the newly
    /// attached analysis's child observables followed by the observable
    /// itself for an observable result (re-examines observables that were
    /// gated on the just-completed dependency).
    fn seed_worklist(&self, target: &RootAnalysis, ar: &AnalysisRequest) -> Result<VecDeque<ObservableIdx>, DispatcherError> {
        if ar.is_root_submission() {
            return Ok(target.all_observable_indices().collect());
        }
        if !ar.is_observable_result() {
            return Ok(VecDeque::new());
        }

        let modified_root = ar
            .modified_root
            .as_ref()
            .ok_or_else(|| DispatcherError::MalformedObservableResult { request: ar.id.clone(), field: "modified_root" })?;
        let amt_name = ar
            .amt_name
            .as_deref()
            .ok_or_else(|| DispatcherError::MalformedObservableResult { request: ar.id.clone(), field: "amt_name" })?;
        let source_obs_idx = ar
            .observable
            .ok_or_else(|| DispatcherError::MalformedObservableResult { request: ar.id.clone(), field: "observable" })?;
        let source_obs = modified_root.observable(source_obs_idx);

        let Some(target_obs_idx) = target.find_observable(&source_obs.otype, &source_obs.value, source_obs.time.as_deref()) else {
            return Err(DispatcherError::UnknownObservable { observable: source_obs_idx, root: target.uuid.clone() });
        };

        let mut worklist = VecDeque::new();
        if let Some(analysis) = target.get_analysis(target_obs_idx, amt_name) {
            worklist.extend(analysis.child_observables.iter().copied());
        }
        worklist.push_back(target_obs_idx);
        Ok(worklist)
    }

    /// True if an untracked, non-terminal request already targets `(obs_idx, amt_name)`
    /// on this root.
    fn has_pending(&self, root: &RootId, obs_idx: ObservableIdx, amt_name: &str) -> bool {
        self.store.by_root(root).iter().any(|r| {
            r.observable == Some(obs_idx) && r.amt_name.as_deref() == Some(amt_name) && !is_terminal(r.status)
        })
    }

    /// Graft a cache hit's analysis onto `target`, since the cache entry's
    /// `modified_root` generally belongs to whichever root first triggered
    /// the computation, not `target` itself.
    fn graft_cached(&self, target: &mut RootAnalysis, cached: &AnalysisRequest, amt_name: &str) -> Option<ace_core::AnalysisIdx> {
        let source_root = cached.modified_root.as_ref()?;
        let source_obs = cached.observable?;
        graft_analysis(target, source_root, source_obs, amt_name)
    }

    /// Step 8: emit an alert if the root has detections and nothing is
    /// outstanding; delete an expiring, detection-free root; else retain.
    async fn finalize(&self, root: &RootId) -> Result<(), DispatcherError> {
        let outstanding = self.store.by_root(root).iter().any(|r| !is_terminal(r.status));
        if outstanding {
            return Ok(());
        }
        let Some(final_root) = self.store.get_root(root) else {
            return Ok(());
        };
        if final_root.has_detections() {
            tracing::info!(root = %root, "root has detections and nothing outstanding, firing alert");
            self.events.publish(Event::Alert { root: root.clone() });
        } else if final_root.expires {
            self.store.delete_root(root);
        }
        Ok(())
    }
}

/// Build the "result" request that `dup` needs to be reprocessed as a
/// completed result: `dup`'s own id/root/version (so it routes and tracks
/// correctly), but `src`'s result body verbatim, per §4.7 step 7.
///
/// `observable`/`amt_name`/`cache_key` stay `src`'s, not `dup`'s: they index
/// into `src.modified_root`'s own arena, which [`Dispatcher::rebase`] grafts
/// onto `dup.root` by identity, not by index — `dup`'s stored index numbers
/// belong to a different arena entirely and would misaddress the graft.
fn fan_out_result(dup: &AnalysisRequest, src: &AnalysisRequest) -> AnalysisRequest {
    let mut fanned = src.clone();
    fanned.id = dup.id.clone();
    fanned.root = dup.root.clone();
    fanned.root_version = dup.root_version;
    fanned
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
