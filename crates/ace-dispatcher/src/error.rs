// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ace_core::{CoreError, RequestId, RootId};
use ace_storage::TrackingStoreError;
use thiserror::Error;

/// Errors raised while driving a request through [`crate::dispatcher::Dispatcher`].
///
/// `StaleVersionError` is not its own variant: it arrives wrapped from
/// [`TrackingStoreError`], the crate that actually enforces the CAS, and
/// survives exhausting the dispatcher's own retry budget unmodified.
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error(transparent)]
    Storage(#[from] TrackingStoreError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request referenced an observable index outside its target root's
    /// arena. Should not happen given identity-based remapping; guards the
    /// arena index operations at the dispatcher boundary regardless.
    #[error("observable {observable} not found in root {root}")]
    UnknownObservable { observable: usize, root: RootId },

    /// A request passing `is_observable_result()` was still missing one of
    /// the fields that check promises. Should not happen — `is_observable_result`
    /// checks all three — but the contract isn't enforced by the type
    /// system, so a future-misconstructed request is rejected here rather
    /// than panicking the dispatcher task.
    #[error("request {request} claims to be an observable result but is missing {field}")]
    MalformedObservableResult { request: RequestId, field: &'static str },
}
