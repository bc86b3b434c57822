// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::StoreError;
use crate::codec::Decoded;
use crate::records::LabTest;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Trait for the medium holding the ordered test sequence
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logs and health output
    fn kind(&self) -> &'static str;

    /// Where the data lives, for logs
    fn location(&self) -> String;

    /// Create the empty medium if it is missing or blank
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Read and decode the full sequence
    async fn load(&self) -> Result<Decoded, StoreError>;

    /// Replace the full sequence
    async fn replace_all(&self, tests: &[LabTest]) -> Result<(), StoreError>;

    /// Append one test at the end.
    ///
    /// The default reads, pushes and rewrites. Rows that failed to decode are
    /// not carried over by the rewrite.
    async fn append(&self, test: &LabTest) -> Result<(), StoreError> {
        let mut decoded = self.load().await?;
        decoded.tests.push(test.clone());
        self.replace_all(&decoded.tests).await
    }
}

/// Writes `contents` to `path` atomically: temp file in the same directory,
/// fsync, then rename over the target. A failure leaves the old file intact.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::medium(parent, e))?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!("{}.tmp.{}", file_name, std::process::id()));

    let result = async {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::medium(path, e));
    }

    Ok(())
}
