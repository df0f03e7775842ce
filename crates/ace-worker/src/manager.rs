// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkerManager`: owns one pool of polling tasks per registered module,
//! each running the pull-execute-submit cycle against a [`System`].

use crate::error::WorkerError;
use crate::execution::{ExecutionOutcome, ExecutionStrategy};
use crate::module::AnalysisModule;
use ace_core::{Analysis, CancellationToken, Clock, IdGen, RequestStatus, WorkerId};
use ace_system::{System, SystemError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How a module's worker pool should react to its own queue depth, checked
/// once per poll iteration by every task in the pool.
///
/// Grounded on the original manager's `compute_scaling` hook (`SCALE_UP` /
/// `NO_SCALING` / `SCALE_DOWN`), simplified from that implementation's
/// per-iteration process/task respawning to one long-lived task per slot: a
/// `Down` verdict simply lets that task exit, an `Up` verdict is left to the
/// caller's own external supervision (this crate does not spawn additional
/// slots mid-run), since §4.8 only requires the hook be consulted, not that
/// this crate implement auto-scaling end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    Up,
    Down,
    None,
}

/// Consulted once per poll iteration with the pool's current active-task
/// count. Defaults to always `Scaling::None` when a module is registered
/// through [`WorkerManager::register_module`].
pub type ScalingHook = Arc<dyn Fn(usize) -> Scaling + Send + Sync>;

const DEFAULT_POLL_WAIT: Duration = Duration::from_secs(5);

fn no_scaling(_active: usize) -> Scaling {
    Scaling::None
}

/// Owns every module's worker pool for one embedding process. Typically one
/// per worker host, holding an `Arc<System<C, G>>` shared with nothing else
/// in that process.
pub struct WorkerManager<C: Clock, G: IdGen + 'static> {
    system: Arc<System<C, G>>,
    cancellation: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: Clock, G: IdGen + 'static> WorkerManager<C, G> {
    pub fn new(system: Arc<System<C, G>>) -> Self {
        Self { system, cancellation: CancellationToken::new(), handles: Mutex::new(Vec::new()) }
    }

    /// A handle a caller can also cancel independently of [`Self::stop`]
    /// (e.g. to fold into a larger shutdown signal).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Register `module` and spawn `AnalysisModuleType::limit` worker tasks
    /// for it, each polling the module's queue independently. Uses a
    /// `Scaling::None` hook; see [`Self::register_module_with_scaling`] to
    /// supply one.
    pub async fn register_module(&self, module: Arc<dyn AnalysisModule>, strategy: Arc<dyn ExecutionStrategy>) -> Result<(), WorkerError> {
        self.register_module_with_scaling(module, strategy, Arc::new(no_scaling)).await
    }

    pub async fn register_module_with_scaling(
        &self,
        module: Arc<dyn AnalysisModule>,
        strategy: Arc<dyn ExecutionStrategy>,
        compute_scaling: ScalingHook,
    ) -> Result<(), WorkerError> {
        let amt = module.analysis_module_type();
        self.system.register_analysis_module_type(amt.clone())?;

        let limit = amt.limit.max(1) as usize;
        let active = Arc::new(AtomicUsize::new(0));
        let mut handles = self.handles.lock();
        for _ in 0..limit {
            handles.push(self.spawn_slot(module.clone(), strategy.clone(), compute_scaling.clone(), active.clone()));
        }
        Ok(())
    }

    fn spawn_slot(
        &self,
        module: Arc<dyn AnalysisModule>,
        strategy: Arc<dyn ExecutionStrategy>,
        compute_scaling: ScalingHook,
        active: Arc<AtomicUsize>,
    ) -> JoinHandle<()> {
        let system = self.system.clone();
        let cancellation = self.cancellation.clone();
        active.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(module_loop(system, module, strategy, compute_scaling, active, cancellation))
    }

    /// Signal every running task to stop after its current iteration.
    /// Idempotent; does not itself wait for the tasks to exit, see
    /// [`Self::join`].
    pub fn stop(&self) {
        self.cancellation.cancel();
    }

    /// Wait for every spawned task to finish. Callers typically call
    /// [`Self::stop`] first; joining without stopping waits for tasks to
    /// exit on their own (a `Scaling::Down` verdict, or a module version
    /// bump observed on poll).
    pub async fn join(&self) {
        let handles = {
            let mut guard = self.handles.lock();
            std::mem::take(&mut *guard)
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// The pull-execute-submit cycle one worker task runs for the lifetime of
/// its module's pool membership.
///
/// Grounded on `ace/module/manager.py`'s `module_loop`/`execute_module`/
/// `process_exception`: poll for scaling and cancellation, pull one request,
/// react to a version mismatch the way `verify_registration` does (a
/// `version` bump shuts the pool down; an `extended_version`-only mismatch
/// attempts `upgrade_module` and re-registers), execute with the configured
/// strategy, and submit the result (or a recorded module error) back through
/// the facade exactly as a successful run would.
async fn module_loop<C: Clock, G: IdGen + 'static>(
    system: Arc<System<C, G>>,
    module: Arc<dyn AnalysisModule>,
    strategy: Arc<dyn ExecutionStrategy>,
    compute_scaling: ScalingHook,
    active: Arc<AtomicUsize>,
    cancellation: CancellationToken,
) {
    let mut current = module.analysis_module_type();
    let worker_id = WorkerId::new(format!("{}-{}", current.name, uuid::Uuid::new_v4()));

    loop {
        if cancellation.is_cancelled() {
            break;
        }
        if compute_scaling(active.load(Ordering::SeqCst)) == Scaling::Down {
            break;
        }

        let next = tokio::select! {
            _ = cancellation.cancelled() => break,
            result = system.get_next_analysis_request(&worker_id, &current.name, &current.version, &current.extended_version, DEFAULT_POLL_WAIT) => result,
        };

        let ar = match next {
            Ok(Some(ar)) => ar,
            Ok(None) => continue,
            Err(SystemError::AnalysisModuleTypeVersion { amt, expected, actual }) => {
                tracing::info!(amt = %amt, expected = %expected, actual = %actual, "module version no longer matches the registry, shutting pool down");
                break;
            }
            Err(SystemError::AnalysisModuleTypeExtendedVersion { amt }) => match module.upgrade().await {
                Ok(upgraded) => {
                    tracing::info!(amt = %amt, "upgraded module's extended_version in place");
                    current = upgraded;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(amt = %amt, error = %err, "module could not upgrade its extended_version, shutting pool down");
                    break;
                }
            },
            Err(err) => {
                tracing::warn!(amt = %current.name, error = %err, "failed to poll for work");
                continue;
            }
        };

        let Some(observable) = ar.observable else {
            tracing::warn!(amt = %current.name, request = ?ar.id, "observable request with no observable index, dropping");
            continue;
        };
        let Some(root) = system.get_root(&ar.root) else {
            tracing::warn!(amt = %current.name, root = ?ar.root, "root referenced by request no longer exists, dropping");
            continue;
        };

        let outcome = tokio::select! {
            _ = cancellation.cancelled() => break,
            outcome = strategy.execute(module.as_ref(), &root, observable, current.timeout) => outcome,
        };

        let analysis = match outcome {
            ExecutionOutcome::Completed(analysis) => analysis,
            ExecutionOutcome::Failed(err) => Analysis::error(&current.name, observable, err.message.clone(), err.stack_trace.clone()),
            ExecutionOutcome::TimedOut => Analysis::error(&current.name, observable, format!("module {} timed out", current.name), None),
        };

        let mut modified = root.clone();
        modified.attach_analysis(analysis);

        let mut result = ar.clone();
        result.status = RequestStatus::Finished;
        result.original_root = Some(root);
        result.modified_root = Some(modified);

        if let Err(err) = system.process_analysis_request(result).await {
            tracing::warn!(amt = %current.name, request = ?ar.id, error = %err, "failed to submit analysis result");
        }
    }

    active.fetch_sub(1, Ordering::SeqCst);
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
