// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ace_core::RootId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackingStoreError {
    #[error("root {0} not found")]
    UnknownRoot(RootId),

    #[error("save of root {root} rejected: stored version {stored} does not match expected {expected}")]
    StaleVersion {
        root: RootId,
        expected: uuid::Uuid,
        stored: uuid::Uuid,
    },

    #[error("request with cache key {0:?} is already tracked in a non-terminal state")]
    DuplicateCacheKey(String),

    #[error("content {0} not found")]
    UnknownContent(String),
}
