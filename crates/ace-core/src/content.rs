// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata for a content-addressed blob stored by the storage facade.

use crate::id::RootId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Metadata record for a blob keyed by its SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub sha256: String,
    pub name: String,
    pub size: u64,
    pub insert_date_epoch_ms: u64,
    pub expiration_date_epoch_ms: Option<u64>,
    #[serde(default)]
    pub roots: HashSet<RootId>,
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

impl ContentMetadata {
    pub fn new(sha256: impl Into<String>, name: impl Into<String>, size: u64, insert_date_epoch_ms: u64) -> Self {
        Self {
            sha256: sha256.into(),
            name: name.into(),
            size,
            insert_date_epoch_ms,
            expiration_date_epoch_ms: None,
            roots: HashSet::new(),
            custom: BTreeMap::new(),
        }
    }

    /// A blob is deletable only once it has no live root references and its
    /// expiration date, if any, has passed.
    pub fn is_expired(&self, now_epoch_ms: u64) -> bool {
        if !self.roots.is_empty() {
            return false;
        }
        match self.expiration_date_epoch_ms {
            Some(exp) => exp <= now_epoch_ms,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
