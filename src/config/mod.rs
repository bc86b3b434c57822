// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Registry configuration
//!
//! Values come from defaults, an optional TOML file and environment variables,
//! in that order of precedence (later wins). Binaries apply CLI flags on top.

use crate::storage::{
    CsvFileBackend, DirectoryKeyValueStore, KeyValueBackend, StorageBackend, DEFAULT_KEY,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Which medium holds the tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Flat delimited-text file
    Csv,
    /// One JSON blob under a key in a local key/value directory
    Kv,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" | "file" => Ok(BackendKind::Csv),
            "kv" | "local" => Ok(BackendKind::Kv),
            other => Err(format!(
                "Unknown storage backend '{}'. Valid: csv, kv",
                other
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Csv => write!(f, "csv"),
            BackendKind::Kv => write!(f, "kv"),
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Address the HTTP API binds to
    pub listen_addr: String,
    pub backend: BackendKind,
    /// Document used by the csv backend
    pub csv_path: PathBuf,
    /// Directory used by the kv backend
    pub kv_dir: PathBuf,
    /// Key holding the test list in the kv backend
    pub kv_key: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3001".to_string(),
            backend: BackendKind::Csv,
            csv_path: PathBuf::from("./public/data/tests.csv"),
            kv_dir: PathBuf::from("./data/kv"),
            kv_key: DEFAULT_KEY.to_string(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: RegistryConfig = toml::from_str(&content)?;
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from a variable lookup. Unparsable values are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(kind) = lookup("STORAGE_BACKEND").and_then(|v| v.parse().ok()) {
            self.backend = kind;
        }
        if let Some(path) = lookup("CSV_PATH") {
            self.csv_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("KV_DIR") {
            self.kv_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup("KV_KEY") {
            self.kv_key = key;
        }
        if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
            self.cors_allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid listen address '{}': {}", self.listen_addr, e))?;

        match self.backend {
            BackendKind::Csv if self.csv_path.as_os_str().is_empty() => {
                return Err("CSV path cannot be empty".to_string());
            }
            BackendKind::Kv if self.kv_dir.as_os_str().is_empty() => {
                return Err("Key/value directory cannot be empty".to_string());
            }
            BackendKind::Kv if self.kv_key.trim().is_empty() => {
                return Err("Key/value key cannot be empty".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    /// Build the storage backend this configuration selects
    pub fn build_backend(&self) -> Arc<dyn StorageBackend> {
        match self.backend {
            BackendKind::Csv => Arc::new(CsvFileBackend::new(self.csv_path.clone())),
            BackendKind::Kv => Arc::new(KeyValueBackend::new(
                Arc::new(DirectoryKeyValueStore::new(self.kv_dir.clone())),
                self.kv_key.clone(),
            )),
        }
    }
}
