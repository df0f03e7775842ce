// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker side of the engine: the [`AnalysisModule`] contract a host
//! implements, the [`ExecutionStrategy`] that actually invokes it (in-task,
//! or in an isolated process), and the [`WorkerManager`] that pulls work
//! from a [`ace_system::System`], runs it, and submits the result.
//!
//! Everything the dispatcher and its substores do is worker-agnostic; this
//! crate is the one piece of the engine a worker *host* process links
//! against, and the only crate that knows about module execution and the
//! cooperative cancellation that shuts it down cleanly.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod execution;
pub mod manager;
pub mod module;

pub use error::WorkerError;
pub use execution::{ExecutionOutcome, ExecutionStrategy, InTaskStrategy, IsolatedProcessStrategy};
pub use manager::{Scaling, ScalingHook, WorkerManager};
pub use module::{AnalysisModule, ModuleError};
