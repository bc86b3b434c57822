// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the record store.

use std::path::Path;
use thiserror::Error;

/// Errors surfaced by [`super::RecordStore`] and its backends.
///
/// Malformed persisted rows are not represented here: they are dropped and
/// counted during decoding instead of failing the operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Candidate rejected before any mutation
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// Position outside the current bounds
    #[error("Test not found at position {position} (store holds {len} tests)")]
    NotFound { position: i64, len: usize },

    /// I/O failure on the backing medium
    #[error("Storage medium error at {path}: {source}")]
    Medium {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Key/value blob that is not a JSON list of tests
    #[error("Stored document is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to encode tests: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Record store is closed")]
    Closed,
}

impl StoreError {
    pub fn medium(path: &Path, source: std::io::Error) -> Self {
        StoreError::Medium {
            path: path.display().to_string(),
            source,
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::InvalidInput { .. } => "INVALID_INPUT",
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::Medium { .. } => "MEDIUM_ERROR",
            StoreError::Corrupt(_) => "CORRUPT_DOCUMENT",
            StoreError::Encode(_) => "ENCODE_ERROR",
            StoreError::Closed => "STORE_CLOSED",
        }
    }

    /// Whether the caller can fix the request and try again.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidInput { .. } | StoreError::NotFound { .. }
        )
    }
}
