// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed blob storage, keyed by SHA-256 hex digest.
//!
//! Grounded in the teacher's storage crate shape: a small facade over
//! on-disk content with metadata tracked separately in memory, writing
//! blobs under a two-level fan-out directory (first four hex characters of
//! the digest) to avoid one huge flat directory.

use ace_core::{ContentMetadata, RootId};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::error::TrackingStoreError;

/// SHA-256-keyed blob store with root back-references driving expiration.
pub struct StorageFacade {
    base_dir: PathBuf,
    meta: Mutex<HashMap<String, ContentMetadata>>,
}

impl StorageFacade {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), meta: Mutex::new(HashMap::new()) }
    }

    fn blob_path(&self, sha256: &str) -> PathBuf {
        let (fan_out, _) = sha256.split_at(sha256.len().min(4));
        self.base_dir.join(fan_out).join(sha256)
    }

    /// Store `bytes` under its SHA-256 digest, recording `name`/`size` and
    /// returning the digest. Idempotent: storing identical bytes twice is a
    /// no-op on disk but still records a fresh `insert_date`-less metadata
    /// merge (existing metadata, if any, is left untouched).
    pub async fn store(&self, bytes: &[u8], name: impl Into<String>, insert_date_epoch_ms: u64) -> std::io::Result<String> {
        let sha256 = format!("{:x}", Sha256::digest(bytes));
        let path = self.blob_path(&sha256);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if !path.exists() {
            let mut file = tokio::fs::File::create(&path).await?;
            file.write_all(bytes).await?;
        }
        self.meta
            .lock()
            .entry(sha256.clone())
            .or_insert_with(|| ContentMetadata::new(sha256.clone(), name.into(), bytes.len() as u64, insert_date_epoch_ms));
        Ok(sha256)
    }

    pub fn get_meta(&self, sha256: &str) -> Option<ContentMetadata> {
        self.meta.lock().get(sha256).cloned()
    }

    pub async fn get_bytes(&self, sha256: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.blob_path(sha256)).await
    }

    /// Open the blob for streaming reads rather than buffering it whole.
    pub async fn get_stream(&self, sha256: &str) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::open(self.blob_path(sha256)).await
    }

    pub async fn delete(&self, sha256: &str) -> std::io::Result<()> {
        self.meta.lock().remove(sha256);
        let path = self.blob_path(sha256);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn add_root_ref(&self, sha256: &str, root: RootId) -> Result<(), TrackingStoreError> {
        let mut meta = self.meta.lock();
        let entry = meta.get_mut(sha256).ok_or_else(|| TrackingStoreError::UnknownContent(sha256.to_string()))?;
        entry.roots.insert(root);
        Ok(())
    }

    pub fn set_expiration(&self, sha256: &str, expiration_date_epoch_ms: Option<u64>) -> Result<(), TrackingStoreError> {
        let mut meta = self.meta.lock();
        let entry = meta.get_mut(sha256).ok_or_else(|| TrackingStoreError::UnknownContent(sha256.to_string()))?;
        entry.expiration_date_epoch_ms = expiration_date_epoch_ms;
        Ok(())
    }

    /// Remove `root` from every entry's back-reference set, then sweep
    /// expired entries — mirrors root deletion retrying expiration cleanup.
    pub fn remove_root_ref_and_sweep(&self, root: &RootId, now_epoch_ms: u64) {
        let mut meta = self.meta.lock();
        for entry in meta.values_mut() {
            entry.roots.remove(root);
        }
        meta.retain(|_, entry| !entry.is_expired(now_epoch_ms));
    }

    /// Snapshot metadata for every entry eligible for expiration as of
    /// `now_epoch_ms`, without deleting anything.
    pub fn expired(&self, now_epoch_ms: u64) -> Vec<ContentMetadata> {
        self.meta.lock().values().filter(|e| e.is_expired(now_epoch_ms)).cloned().collect()
    }

    /// Delete metadata (and backing file, best-effort) for entries whose
    /// `expiration_date` has passed and which have no live root reference.
    pub async fn delete_expired(&self, now_epoch_ms: u64) {
        let expired: Vec<String> = {
            let meta = self.meta.lock();
            meta.iter().filter(|(_, e)| e.is_expired(now_epoch_ms)).map(|(k, _)| k.clone()).collect()
        };
        for sha256 in expired {
            let _ = self.delete(&sha256).await;
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Shared handle, wired into `System` alongside the tracking store.
pub type SharedStorageFacade = Arc<StorageFacade>;

#[cfg(test)]
#[path = "storage_facade_tests.rs"]
mod tests;
