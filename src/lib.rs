// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod codec;
pub mod config;
pub mod logging;
pub mod records;
pub mod storage;
pub mod validation;
pub mod version;

// Re-export main types
pub use codec::Decoded;
pub use config::{BackendKind, RegistryConfig};
pub use records::{LabTest, Parameter};
pub use storage::{RecordStore, StorageBackend, StoreError};
pub use validation::TestPayload;
