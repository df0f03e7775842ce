// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data model shared by every ACE crate: ids, the observable/analysis arena
//! types that make up a [`root::RootAnalysis`], the analysis module type
//! registration record, lifecycle events, and the injectable [`clock::Clock`].
//!
//! This crate has no I/O of its own; it exists so `ace-storage`, `ace-queue`,
//! `ace-registry`, `ace-dispatcher`, `ace-worker` and `ace-system` share one
//! definition of these types instead of each redefining them.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod amt;
pub mod analysis;
pub mod cancellation;
pub mod clock;
pub mod content;
pub mod error;
pub mod event;
pub mod id;
pub mod observable;
pub mod request;
pub mod root;

pub use amt::AnalysisModuleType;
pub use analysis::{Analysis, AnalysisIdx};
pub use cancellation::CancellationToken;
pub use clock::{Clock, FakeClock, SystemClock};
pub use content::ContentMetadata;
pub use error::CoreError;
pub use event::{Event, EventSink, NullEventSink};
pub use id::{DetailsId, IdGen, RequestId, RootId, SequentialIdGen, ShortId, UuidIdGen, WorkerId};
pub use observable::{Observable, ObservableIdx, MANUAL_DIRECTIVE_PREFIX};
pub use request::{AnalysisRequest, RequestStatus};
pub use root::{apply_diff_merge, graft_analysis, RootAnalysis};
