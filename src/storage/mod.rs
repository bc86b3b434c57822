// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod backend;
pub mod csv_file;
pub mod error;
pub mod kv;
pub mod record_store;

// Re-export main types for convenience
pub use backend::{write_atomic, StorageBackend};
pub use csv_file::CsvFileBackend;
pub use error::StoreError;
pub use kv::{
    decode_blob, DirectoryKeyValueStore, KeyValueBackend, KeyValueStore, MemoryKeyValueStore,
    DEFAULT_KEY,
};
pub use record_store::{RecordStore, StoreStats};
