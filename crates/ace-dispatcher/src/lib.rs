// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The analysis-request dispatcher: decomposes submitted roots and worker
//! results into per-(observable, module) requests, merges results back
//! under optimistic concurrency, and emits finished roots as alerts.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod dispatcher;
pub mod error;

pub use dispatcher::Dispatcher;
pub use error::DispatcherError;
