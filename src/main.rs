// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use labtest_registry::{
    api::{start_server, AppState},
    config::RegistryConfig,
    logging::{env_filter, LOG_ENV},
    storage::RecordStore,
    version,
};
use std::{env, sync::Arc};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging (.env is loaded first)
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(LOG_ENV, "info"))
        .init();

    println!("🚀 Starting Lab Test Registry...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    // First argument, then CONFIG_FILE, then plain environment
    let config_file = env::args().nth(1).or_else(|| env::var("CONFIG_FILE").ok());
    let config = match config_file {
        Some(path) => {
            println!("📄 Loading configuration from {}", path);
            RegistryConfig::from_file(&path)?
        }
        None => RegistryConfig::from_env(),
    };
    config.validate().map_err(|e| anyhow!(e))?;

    println!("🗄️  Opening {} store...", config.backend);
    let store = Arc::new(RecordStore::open(config.build_backend()).await?);
    let listing = store.list().await?;
    println!(
        "✅ Store ready at {} ({} tests)",
        store.location(),
        listing.tests.len()
    );
    if listing.skipped > 0 {
        println!("⚠️  {} malformed rows skipped while loading", listing.skipped);
    }

    let state = AppState::new(store).with_cors_origins(config.cors_allowed_origins.clone());

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("API Endpoints:");
    println!("  Health:   http://{}/health", config.listen_addr);
    println!("  List:     GET    http://{}/records", config.listen_addr);
    println!("  Add:      POST   http://{}/records", config.listen_addr);
    println!("  Update:   PUT    http://{}/records/{{position}}", config.listen_addr);
    println!("  Delete:   DELETE http://{}/records/{{position}}", config.listen_addr);
    println!("  Export:   GET    http://{}/records/export", config.listen_addr);
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    start_server(&config.listen_addr, state, async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        println!("\n⏹️  Shutting down...");
    })
    .await?;

    println!("👋 Goodbye!");
    Ok(())
}
