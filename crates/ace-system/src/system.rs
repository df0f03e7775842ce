// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `System`: the facade wiring every substore and the dispatcher together
//! behind the logical external-interface surface, replacing what the
//! original source kept as module-level global process state with one
//! explicit value callers own and pass around.

use crate::config::SystemConfig;
use crate::error::SystemError;
use ace_core::{
    AnalysisModuleType, AnalysisRequest, Clock, Event, EventSink, IdGen, Observable, RequestId,
    RequestStatus, RootAnalysis, RootId, WorkerId,
};
use ace_dispatcher::Dispatcher;
use ace_events::{AlertRegistry, EventBus};
use ace_queue::{LockManager, WorkQueueRegistry, EXPIRED_ANALYSIS_REQUESTS_LOCK};
use ace_registry::Registry;
use ace_storage::{cache_key, ResultCache, SharedStorageFacade, StorageFacade, TrackingStore};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The analysis correlation engine's external-facing surface. One value per
/// running engine, shared behind an `Arc` by every caller (HTTP handlers,
/// worker-pull loops, test harnesses) instead of the module-level globals
/// the original source relied on.
pub struct System<C: Clock, G: IdGen> {
    store: Arc<TrackingStore>,
    cache: Arc<ResultCache>,
    queues: Arc<WorkQueueRegistry>,
    registry: Arc<Registry>,
    events: Arc<EventBus>,
    alerts: Arc<AlertRegistry>,
    locks: Arc<LockManager>,
    storage: SharedStorageFacade,
    dispatcher: Dispatcher<C, G>,
    clock: C,
    id_gen: G,
    config: SystemConfig,
}

impl<C: Clock, G: IdGen> System<C, G> {
    /// Wire a fresh engine: every substore starts empty, file blobs are
    /// rooted at `base_dir`, and the alert-routing and content-sweep event
    /// handlers are installed before anything is returned, so no caller can
    /// observe the facade half-wired.
    pub fn new(base_dir: impl Into<std::path::PathBuf>, clock: C, id_gen: G, config: SystemConfig) -> Self {
        let events = Arc::new(EventBus::new());
        let alerts = Arc::new(AlertRegistry::new());
        let storage = Arc::new(StorageFacade::new(base_dir));

        let alerts_for_handler = alerts.clone();
        events.register("alert", Box::new(move |event| alerts_for_handler.handle(event)));

        let storage_for_handler = storage.clone();
        let clock_for_handler = clock.clone();
        events.register(
            "root/deleted",
            Box::new(move |event| {
                if let Event::RootDeleted { root } = event {
                    storage_for_handler.remove_root_ref_and_sweep(root, clock_for_handler.epoch_ms());
                }
            }),
        );

        let store = Arc::new(TrackingStore::new(events.clone() as Arc<dyn EventSink>));
        let cache = Arc::new(ResultCache::new());
        let queues = Arc::new(WorkQueueRegistry::new());
        let registry = Arc::new(Registry::new());
        let locks = Arc::new(LockManager::new());

        let dispatcher = Dispatcher::new(
            store.clone(),
            cache.clone(),
            queues.clone(),
            registry.clone(),
            events.clone() as Arc<dyn EventSink>,
            clock.clone(),
            id_gen.clone(),
        )
        .with_max_retries(config.max_retries);

        Self { store, cache, queues, registry, events, alerts, locks, storage, dispatcher, clock, id_gen, config }
    }

    // ---- Submission & retrieval ------------------------------------------------

    /// Persist `root` under a freshly-minted uuid and drive it through the
    /// dispatcher end to end. Returns the assigned uuid.
    pub async fn submit(&self, mut root: RootAnalysis) -> Result<RootId, SystemError> {
        root.uuid = RootId::new(self.id_gen.next());
        let uuid = root.uuid.clone();
        self.store.insert_root(root.clone());
        let ar = AnalysisRequest::for_root_submission(RequestId::new(self.id_gen.next()), &root);
        self.dispatcher.process_analysis_request(ar).await?;
        Ok(uuid)
    }

    pub fn get_root(&self, uuid: &RootId) -> Option<RootAnalysis> {
        self.store.get_root(uuid)
    }

    /// Delete a root outright. Fires `root/deleted`, which the content-sweep
    /// handler installed in [`System::new`] reacts to by dropping that
    /// root's file-blob back-references.
    pub fn delete_root_analysis(&self, uuid: &RootId) -> Option<RootAnalysis> {
        self.store.delete_root(uuid)
    }

    /// Cancel `root` at any point in its lifecycle, including while work is
    /// still in flight: loads the current root, applies `reason` via
    /// [`RootAnalysis::cancel`], and saves it back through the same CAS
    /// retry loop [`System::process_analysis_request`] drives, so a worker
    /// completion racing this call can't silently lose either write. A
    /// result merged in afterwards keeps the cancellation (`apply_diff_merge`
    /// only overwrites `analysis_cancelled` when the worker's own before/after
    /// snapshot disagrees, which a result computed before cancellation never
    /// does).
    pub async fn cancel_analysis(&self, root: &RootId, reason: impl Into<String>) -> Result<RootAnalysis, SystemError> {
        let reason = reason.into();
        let mut attempts = 0;
        loop {
            let mut target = self
                .store
                .get_root(root)
                .ok_or_else(|| ace_storage::TrackingStoreError::UnknownRoot(root.clone()))?;
            let expected_version = target.version;
            target.cancel(reason.clone());
            let saved = target.clone();
            match self.store.save_root(target, expected_version) {
                Ok(new_version) => {
                    let mut result = saved;
                    result.version = new_version;
                    return Ok(result);
                }
                Err(ace_storage::TrackingStoreError::StaleVersion { .. }) if attempts < self.config.max_retries => {
                    attempts += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub fn get_analysis_details(&self, details_id: &str) -> Option<serde_json::Value> {
        self.store.get_details(details_id)
    }

    pub fn put_analysis_details(&self, details_id: impl Into<String>, blob: serde_json::Value) {
        self.store.put_details(details_id, blob)
    }

    // ---- Module registry --------------------------------------------------------

    pub fn register_analysis_module_type(&self, amt: AnalysisModuleType) -> Result<AnalysisModuleType, SystemError> {
        Ok(self.registry.register(amt, &self.queues, &self.cache)?)
    }

    pub fn get_analysis_module_type(&self, name: &str) -> Option<AnalysisModuleType> {
        self.registry.get(name)
    }

    pub fn delete_analysis_module_type(&self, name: &str) -> Option<AnalysisModuleType> {
        self.registry.delete(name, &self.queues)
    }

    pub fn list_analysis_module_types(&self) -> Vec<AnalysisModuleType> {
        self.registry.list()
    }

    // ---- Worker-facing scheduling -------------------------------------------------

    /// Pop the next request for `amt_name`, waiting up to `wait_time`.
    /// Returns `Err` instead of a stale request when the caller's loaded
    /// module no longer matches the registered `version`/`extended_version`
    /// (a new deployment, or a live rule-set upgrade the worker hasn't
    /// applied yet) rather than handing back work it can't safely execute.
    pub async fn get_next_analysis_request(
        &self,
        worker: &WorkerId,
        amt_name: &str,
        version: &str,
        extended_version: &BTreeMap<String, String>,
        wait_time: Duration,
    ) -> Result<Option<AnalysisRequest>, SystemError> {
        let amt = self
            .registry
            .get(amt_name)
            .ok_or_else(|| SystemError::UnknownAnalysisModuleType(amt_name.to_string()))?;
        if amt.version != version {
            return Err(SystemError::AnalysisModuleTypeVersion {
                amt: amt_name.to_string(),
                expected: amt.version.clone(),
                actual: version.to_string(),
            });
        }
        if &amt.extended_version != extended_version {
            return Err(SystemError::AnalysisModuleTypeExtendedVersion { amt: amt_name.to_string() });
        }

        self.sweep_expired_requests().await;

        let Some(queue) = self.queues.get_work_queue(amt_name) else {
            return Ok(None);
        };
        let Some(mut ar) = queue.pop(wait_time).await else {
            return Ok(None);
        };
        ar.status = RequestStatus::Analyzing;
        ar.owner = Some(worker.clone());
        ar.deadline_epoch_ms = Some(self.clock.epoch_ms().saturating_add(amt.timeout.as_millis() as u64));
        self.store.update_request(ar.clone());
        Ok(Some(ar))
    }

    /// Same as [`System::get_next_analysis_request`] but blocking for
    /// [`SystemConfig::default_wait_time`].
    pub async fn get_next_analysis_request_default_wait(
        &self,
        worker: &WorkerId,
        amt_name: &str,
        version: &str,
        extended_version: &BTreeMap<String, String>,
    ) -> Result<Option<AnalysisRequest>, SystemError> {
        self.get_next_analysis_request(worker, amt_name, version, extended_version, self.config.default_wait_time)
            .await
    }

    /// Deliver a worker's result (or re-submit a root) through the
    /// dispatcher.
    pub async fn process_analysis_request(&self, ar: AnalysisRequest) -> Result<(), SystemError> {
        self.dispatcher.process_analysis_request(ar).await?;
        Ok(())
    }

    /// Re-queue every `Analyzing` request past its deadline, under the
    /// system-wide expired-request lock so two callers can't race the same
    /// sweep. Returns the requests that were re-queued. Called automatically
    /// by [`System::get_next_analysis_request`] before popping, so a
    /// zero-timeout module's abandoned request becomes available again on
    /// the very next pull.
    pub async fn sweep_expired_requests(&self) -> Vec<AnalysisRequest> {
        let acquired = self
            .locks
            .acquire(EXPIRED_ANALYSIS_REQUESTS_LOCK, "system", Duration::ZERO, self.config.expired_sweep_lock_ttl, &self.clock)
            .await;
        if !acquired {
            return Vec::new();
        }

        let now = self.clock.epoch_ms();
        let expired = self.store.expired_requests(now);
        for ar in &expired {
            let mut requeued = ar.clone();
            requeued.status = RequestStatus::Queued;
            requeued.owner = None;
            self.store.update_request(requeued.clone());
            if let Some(amt_name) = requeued.amt_name.clone() {
                if let Some(queue) = self.queues.get_work_queue(&amt_name) {
                    queue.put(requeued).await;
                }
            }
        }

        self.locks.release(EXPIRED_ANALYSIS_REQUESTS_LOCK, "system");
        expired
    }

    pub async fn get_queue_size(&self, amt_name: &str) -> usize {
        match self.queues.get_work_queue(amt_name) {
            Some(queue) => queue.size().await,
            None => 0,
        }
    }

    pub fn get_cached_analysis_result(&self, observable: &Observable, amt_name: &str) -> Option<AnalysisRequest> {
        let amt = self.registry.get(amt_name)?;
        let key = cache_key(observable, &amt)?;
        self.cache.get(&key, self.clock.epoch_ms())
    }

    // ---- Alerting -----------------------------------------------------------------

    pub fn register_alert_system(&self, name: impl Into<String>) {
        self.alerts.register_alert_system(name);
    }

    pub async fn get_alerts(&self, name: &str, timeout: Duration) -> Vec<RootId> {
        self.alerts.get_alerts(name, timeout).await
    }

    pub fn get_alert_count(&self, name: &str) -> usize {
        self.alerts.get_alert_count(name)
    }

    // ---- Content storage ------------------------------------------------------------

    pub async fn store_content(&self, bytes: &[u8], name: impl Into<String>) -> Result<String, SystemError> {
        Ok(self.storage.store(bytes, name, self.clock.epoch_ms()).await?)
    }

    pub async fn store_file(&self, path: impl AsRef<Path>, name: impl Into<String>) -> Result<String, SystemError> {
        let bytes = tokio::fs::read(path).await?;
        self.store_content(&bytes, name).await
    }

    pub fn get_content_meta(&self, sha256: &str) -> Option<ace_core::ContentMetadata> {
        self.storage.get_meta(sha256)
    }

    pub async fn get_content_bytes(&self, sha256: &str) -> Result<Vec<u8>, SystemError> {
        Ok(self.storage.get_bytes(sha256).await?)
    }

    pub async fn get_content_stream(&self, sha256: &str) -> Result<tokio::fs::File, SystemError> {
        Ok(self.storage.get_stream(sha256).await?)
    }

    pub async fn delete_content(&self, sha256: &str) -> Result<(), SystemError> {
        Ok(self.storage.delete(sha256).await?)
    }

    pub fn link_content_to_root(&self, sha256: &str, root: RootId) -> Result<(), SystemError> {
        Ok(self.storage.add_root_ref(sha256, root)?)
    }

    pub fn set_content_expiration(&self, sha256: &str, expiration_date_epoch_ms: Option<u64>) -> Result<(), SystemError> {
        Ok(self.storage.set_expiration(sha256, expiration_date_epoch_ms)?)
    }

    pub fn iter_expired_content(&self, now_epoch_ms: u64) -> Vec<ace_core::ContentMetadata> {
        self.storage.expired(now_epoch_ms)
    }

    pub async fn delete_expired_content(&self, now_epoch_ms: u64) {
        self.storage.delete_expired(now_epoch_ms).await;
    }

    /// Clear every substore in one exclusive pass, for test isolation
    /// between cases sharing a long-lived `System`. The only reset hook this
    /// crate exposes: no substore's own `reset` is meant to be called
    /// independently of this one (resolved Open Question (c)).
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.store.reset();
        self.cache.reset();
        self.queues.reset();
        self.registry.reset();
        self.alerts.reset();
        self.locks.reset();
        self.events.reset();
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
