// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Flat delimited-text file backend.

use super::backend::{write_atomic, StorageBackend};
use super::StoreError;
use crate::codec::{self, Decoded, HEADER};
use crate::records::LabTest;
use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info};

/// Stores the test sequence as one CSV document on disk.
pub struct CsvFileBackend {
    path: PathBuf,
}

impl CsvFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::medium(&self.path, e)),
        }
    }

    // Whether the last byte of the file is a newline; empty files count as
    // terminated.
    async fn ends_with_newline(&self) -> Result<bool, StoreError> {
        let mut file = fs::File::open(&self.path)
            .await
            .map_err(|e| StoreError::medium(&self.path, e))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| StoreError::medium(&self.path, e))?
            .len();
        if len == 0 {
            return Ok(true);
        }
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))
            .await
            .map_err(|e| StoreError::medium(&self.path, e))?;
        file.read_exact(&mut last)
            .await
            .map_err(|e| StoreError::medium(&self.path, e))?;
        Ok(last[0] == b'\n')
    }
}

#[async_trait]
impl StorageBackend for CsvFileBackend {
    fn kind(&self) -> &'static str {
        "csv"
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        let existing = self.read_document().await?;
        if existing.map_or(true, |content| content.trim().is_empty()) {
            info!("Initializing test document at {}", self.path.display());
            write_atomic(&self.path, format!("{}\n", HEADER).as_bytes()).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<Decoded, StoreError> {
        self.initialize().await?;
        let content = self.read_document().await?.unwrap_or_default();
        let decoded = codec::decode(&content);
        debug!(
            "Loaded {} tests from {} ({} skipped)",
            decoded.tests.len(),
            self.path.display(),
            decoded.skipped
        );
        Ok(decoded)
    }

    async fn replace_all(&self, tests: &[LabTest]) -> Result<(), StoreError> {
        let document = codec::encode(tests)?;
        write_atomic(&self.path, document.as_bytes()).await?;
        debug!("Rewrote {} with {} tests", self.path.display(), tests.len());
        Ok(())
    }

    /// Appends a single row without re-encoding the existing ones.
    async fn append(&self, test: &LabTest) -> Result<(), StoreError> {
        self.initialize().await?;

        let mut row = String::new();
        if !self.ends_with_newline().await? {
            row.push('\n');
        }
        row.push_str(&codec::encode_row(test)?);
        row.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StoreError::medium(&self.path, e))?;
        file.write_all(row.as_bytes())
            .await
            .map_err(|e| StoreError::medium(&self.path, e))?;
        file.sync_all()
            .await
            .map_err(|e| StoreError::medium(&self.path, e))?;

        debug!("Appended '{}' to {}", test.name, self.path.display());
        Ok(())
    }
}
