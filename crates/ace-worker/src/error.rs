// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ace_system::SystemError;
use thiserror::Error;

/// Errors raised while registering or running a [`crate::manager::WorkerManager`].
///
/// A module's own runtime failures never reach this enum: those are caught
/// by the module loop and recorded as [`ace_core::Analysis::error`] results
/// instead, per the error-handling design. This enum is for failures of the
/// manager's own plumbing: registration, or the facade calls a module loop
/// drives.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    System(#[from] SystemError),
}
