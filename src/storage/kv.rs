// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local key/value backend.
//!
//! The whole test sequence lives as one JSON array under a single key. Every
//! operation reads the blob, mutates it in memory and writes it back.

use super::backend::{write_atomic, StorageBackend};
use super::StoreError;
use crate::codec::Decoded;
use crate::records::LabTest;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default key holding the test list.
pub const DEFAULT_KEY: &str = "tests";

/// Trait for string key/value media
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn location(&self) -> String;
}

/// Process-local key/value store
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Directory-backed key/value store: one `<key>.json` file per key.
pub struct DirectoryKeyValueStore {
    base_path: PathBuf,
}

impl DirectoryKeyValueStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidInput {
                field: "key".to_string(),
                message: format!("'{}' is not a usable storage key", key),
            });
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for DirectoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::medium(&path, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        write_atomic(&path, value.as_bytes()).await
    }

    fn location(&self) -> String {
        self.base_path.display().to_string()
    }
}

/// Storage backend keeping the sequence as a JSON blob under one key.
pub struct KeyValueBackend {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl KeyValueBackend {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Decodes a blob element by element; entries that are not tests are counted
/// as skipped. A blob that is not a JSON array is corrupt.
pub fn decode_blob(blob: &str) -> Result<Decoded, StoreError> {
    let items: Vec<Value> = serde_json::from_str(blob)
        .map_err(|e| StoreError::Corrupt(format!("expected a JSON list of tests: {}", e)))?;

    let mut decoded = Decoded::default();
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<LabTest>(item) {
            Ok(test) => decoded.tests.push(test),
            Err(e) => {
                warn!("Skipping malformed entry {} in stored blob: {}", idx, e);
                decoded.skipped += 1;
            }
        }
    }
    Ok(decoded)
}

#[async_trait]
impl StorageBackend for KeyValueBackend {
    fn kind(&self) -> &'static str {
        "kv"
    }

    fn location(&self) -> String {
        format!("{}#{}", self.store.location(), self.key)
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        let existing = self.store.get(&self.key).await?;
        if existing.map_or(true, |blob| blob.trim().is_empty()) {
            info!("Initializing empty test list under key '{}'", self.key);
            self.store.set(&self.key, "[]").await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<Decoded, StoreError> {
        self.initialize().await?;
        let blob = self.store.get(&self.key).await?.unwrap_or_default();
        let decoded = decode_blob(&blob)?;
        debug!(
            "Loaded {} tests from key '{}' ({} skipped)",
            decoded.tests.len(),
            self.key,
            decoded.skipped
        );
        Ok(decoded)
    }

    async fn replace_all(&self, tests: &[LabTest]) -> Result<(), StoreError> {
        let blob = serde_json::to_string(tests)?;
        self.store.set(&self.key, &blob).await
    }
}
