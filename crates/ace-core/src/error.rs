// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by pure data-model operations (merges, arena lookups).
//!
//! Component-level errors (stale version, unknown AMT, dependency cycles,
//! ...) belong to the crate that actually enforces them (`ace-storage`,
//! `ace-registry`, `ace-dispatcher`); this enum only covers invariant
//! violations the data types themselves can detect.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("cannot merge root {after} into root {target}: root identity mismatch")]
    RootMismatch { target: String, after: String },
}
