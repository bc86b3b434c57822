// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Log filter setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Variable holding the log directives
pub const LOG_ENV: &str = "RUST_LOG";

/// Loads `.env` into the process environment, then builds the filter from
/// `var`. Falls back to `default` when `var` is unset or unparsable.
pub fn env_filter(var: &str, default: &str) -> EnvFilter {
    dotenv::dotenv().ok();
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}
