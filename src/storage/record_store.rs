// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Record Store
//!
//! Owns the authoritative ordered sequence of lab tests and serves list, add,
//! update, delete and export against a [`StorageBackend`]. Position is the
//! only identity, so every operation runs under a single-writer lock and a
//! read-modify-write cycle never interleaves with another caller.

use super::backend::StorageBackend;
use super::StoreError;
use crate::codec::{self, Decoded};
use crate::records::LabTest;
use crate::validation::TestPayload;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Counters about store activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub lists: u64,
    pub adds: u64,
    pub updates: u64,
    pub deletes: u64,
    pub exports: u64,
    /// Malformed rows seen by the most recent load
    pub last_skipped_rows: usize,
}

/// Ordered test store over a pluggable backend
pub struct RecordStore {
    backend: Arc<dyn StorageBackend>,
    write_lock: Mutex<()>,
    stats: RwLock<StoreStats>,
    closed: AtomicBool,
}

impl RecordStore {
    /// Open the store, initializing the medium if it is missing or blank.
    pub async fn open(backend: Arc<dyn StorageBackend>) -> Result<Self, StoreError> {
        backend.initialize().await?;
        info!(
            "📂 Record store opened ({} at {})",
            backend.kind(),
            backend.location()
        );
        Ok(Self {
            backend,
            write_lock: Mutex::new(()),
            stats: RwLock::new(StoreStats::default()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    async fn load(&self) -> Result<Decoded, StoreError> {
        let decoded = self.backend.load().await?;
        if decoded.skipped > 0 {
            warn!(
                "⚠️ {} malformed rows skipped while loading {}",
                decoded.skipped,
                self.backend.location()
            );
        }
        self.stats.write().await.last_skipped_rows = decoded.skipped;
        Ok(decoded)
    }

    /// All tests in stored order, with the count of rows that failed to decode.
    pub async fn list(&self) -> Result<Decoded, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        let decoded = self.load().await?;
        self.stats.write().await.lists += 1;
        debug!("Listed {} tests", decoded.tests.len());
        Ok(decoded)
    }

    /// Validate and append a candidate. Returns the stored record.
    pub async fn add(&self, candidate: &TestPayload) -> Result<LabTest, StoreError> {
        let test = candidate.validate().map_err(|e| {
            warn!("Rejected new test: {}", e);
            e
        })?;

        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;
        self.backend.append(&test).await?;
        self.stats.write().await.adds += 1;

        info!("✅ Added test '{}'", test.name);
        Ok(test)
    }

    /// Replace the test at `position` in place. Returns the stored record.
    pub async fn update(
        &self,
        position: i64,
        candidate: &TestPayload,
    ) -> Result<LabTest, StoreError> {
        let test = candidate.validate().map_err(|e| {
            warn!("Rejected update at position {}: {}", position, e);
            e
        })?;

        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;
        let mut decoded = self.load().await?;
        let index = checked_index(position, decoded.tests.len())?;
        warn_rewrite_drops(&decoded);

        decoded.tests[index] = test.clone();
        self.backend.replace_all(&decoded.tests).await?;
        self.stats.write().await.updates += 1;

        info!("✏️ Updated test at position {} ('{}')", index, test.name);
        Ok(test)
    }

    /// Remove the test at `position`; later positions shift down by one.
    /// Returns the removed record.
    pub async fn delete(&self, position: i64) -> Result<LabTest, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        let mut decoded = self.load().await?;
        let index = checked_index(position, decoded.tests.len())?;
        warn_rewrite_drops(&decoded);

        let removed = decoded.tests.remove(index);
        self.backend.replace_all(&decoded.tests).await?;
        self.stats.write().await.deletes += 1;

        info!("🗑️ Deleted test at position {} ('{}')", index, removed.name);
        Ok(removed)
    }

    /// Denormalized CSV of the current sequence, one row per parameter.
    pub async fn export(&self) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_open()?;

        let decoded = self.load().await?;
        self.stats.write().await.exports += 1;
        Ok(codec::export_csv(&decoded.tests))
    }

    pub async fn stats(&self) -> StoreStats {
        self.stats.read().await.clone()
    }

    /// Close the store. Waits for the in-flight operation, after which every
    /// call fails with [`StoreError::Closed`].
    pub async fn close(&self) {
        let _guard = self.write_lock.lock().await;
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Record store closed ({})", self.backend.location());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn checked_index(position: i64, len: usize) -> Result<usize, StoreError> {
    usize::try_from(position)
        .ok()
        .filter(|&index| index < len)
        .ok_or(StoreError::NotFound { position, len })
}

fn warn_rewrite_drops(decoded: &Decoded) {
    if decoded.skipped > 0 {
        warn!(
            "Rewriting store drops {} malformed rows that could not be decoded",
            decoded.skipped
        );
    }
}
