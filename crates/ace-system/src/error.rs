// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ace_dispatcher::DispatcherError;
use ace_registry::RegistryError;
use ace_storage::TrackingStoreError;
use thiserror::Error;

/// Errors surfaced by the [`crate::system::System`] facade.
///
/// Every substore already owns its domain's errors (`TrackingStoreError`,
/// `RegistryError`, `DispatcherError`); this enum wraps them transparently,
/// exactly as the engine crate's `RuntimeError::Execute(#[from] ExecuteError)`
/// already does, and adds the handful of variants that belong at the facade
/// layer because no sub-crate enforces them: module version/extended_version
/// mismatches detected on worker pull, and the interface-only taxonomy slots
/// for out-of-scope collaborators (API-key management, encryption-at-rest,
/// alert-system registration) whose *interfaces* this crate specifies even
/// though their implementations are out of scope.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Storage(#[from] TrackingStoreError),

    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("analysis module type {0} is not registered")]
    UnknownAnalysisModuleType(String),

    /// Raised by `get_next_analysis_request` when a worker's loaded module
    /// version no longer matches the registered one (a new deployment has
    /// drained its queue out from under it).
    #[error("worker offered {amt} version {actual:?}, registry has {expected:?}")]
    AnalysisModuleTypeVersion { amt: String, expected: String, actual: String },

    /// Raised by `get_next_analysis_request` when only `extended_version`
    /// differs; the worker manager is expected to attempt a live upgrade
    /// before calling back in with the new extended_version.
    #[error("worker's extended_version for {amt} does not match the registered module")]
    AnalysisModuleTypeExtendedVersion { amt: String },

    #[error("an API key named {0:?} is already registered")]
    DuplicateApiKeyName(String),

    #[error("password does not satisfy the configured policy")]
    InvalidPassword,

    #[error("encryption-at-rest settings are not configured")]
    MissingEncryptionSettings,

    #[error("alert system {0:?} is not registered")]
    UnknownAlertSystem(String),
}
