// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::records::LabTest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTestResponse {
    pub success: bool,
    pub test: LabTest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    /// Rows dropped by the most recent load of the medium
    pub skipped_rows: usize,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Parses a path position. Anything that is not an integer cannot address a
/// test, so `None` is reported the same way as an out-of-range position.
pub fn parse_position(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}
