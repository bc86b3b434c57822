// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::codec;
use crate::config::{BackendKind, RegistryConfig};
use crate::records::LabTest;
use crate::storage::{write_atomic, RecordStore};
use crate::validation::TestPayload;

/// Storage selection shared by every command
#[derive(Args, Debug, Default)]
pub struct StorageArgs {
    /// TOML configuration file
    #[arg(long, global = true, env = "LABTEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage backend (csv or kv)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// CSV document used by the csv backend
    #[arg(long, global = true)]
    pub csv_path: Option<PathBuf>,

    /// Directory used by the kv backend
    #[arg(long, global = true)]
    pub kv_dir: Option<PathBuf>,

    /// Key holding the test list in the kv backend
    #[arg(long, global = true)]
    pub kv_key: Option<String>,
}

impl StorageArgs {
    /// Config file (or environment), then flags on top.
    pub fn resolve(&self) -> Result<RegistryConfig> {
        dotenv::dotenv().ok();

        let mut config = match &self.config {
            Some(path) => RegistryConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RegistryConfig::from_env(),
        };
        self.apply(&mut config)?;
        config.validate().map_err(|e| anyhow!(e))?;
        Ok(config)
    }

    fn apply(&self, config: &mut RegistryConfig) -> Result<()> {
        if let Some(backend) = &self.backend {
            config.backend = backend.parse::<BackendKind>().map_err(|e| anyhow!(e))?;
        }
        if let Some(path) = &self.csv_path {
            config.csv_path = path.clone();
        }
        if let Some(dir) = &self.kv_dir {
            config.kv_dir = dir.clone();
        }
        if let Some(key) = &self.kv_key {
            config.kv_key = key.clone();
        }
        Ok(())
    }
}

/// Arguments for list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print the tests as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Test as JSON: {"name": ..., "price": ..., "parameters": [...]}
    #[arg(long)]
    pub json: String,
}

/// Arguments for update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Zero-based position of the test to replace
    #[arg(allow_negative_numbers = true)]
    pub position: i64,

    /// Replacement test as JSON
    #[arg(long)]
    pub json: String,
}

/// Arguments for delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Zero-based position of the test to delete
    #[arg(allow_negative_numbers = true)]
    pub position: i64,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

/// Arguments for export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments for import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV document in the persisted three-column format
    #[arg(long)]
    pub from: PathBuf,
}

async fn open_store(config: &RegistryConfig) -> Result<RecordStore> {
    Ok(RecordStore::open(config.build_backend()).await?)
}

fn parse_payload(json: &str) -> Result<TestPayload> {
    serde_json::from_str(json).context("Test payload is not valid JSON")
}

fn summary_line(position: usize, test: &LabTest) -> String {
    format!(
        "{:>3}  {}  {}  ({} params)",
        position,
        test.name,
        codec::format_price(test.price),
        test.parameters.len()
    )
}

/// Reads a yes/no answer. Only `y` or `yes` (any case) confirm.
pub fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> io::Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub async fn list_tests(config: &RegistryConfig, args: ListArgs) -> Result<()> {
    let store = open_store(config).await?;
    let listing = store.list().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing.tests)?);
    } else if listing.tests.is_empty() {
        println!("No tests stored yet.");
    } else {
        for (position, test) in listing.tests.iter().enumerate() {
            println!("{}", summary_line(position, test));
        }
    }

    if listing.skipped > 0 {
        eprintln!("⚠️  {} malformed rows were skipped", listing.skipped);
    }
    Ok(())
}

pub async fn add_test(config: &RegistryConfig, args: AddArgs) -> Result<()> {
    let payload = parse_payload(&args.json)?;
    let store = open_store(config).await?;
    let test = store.add(&payload).await?;
    println!("✅ Added '{}'", test.name);
    Ok(())
}

pub async fn update_test(config: &RegistryConfig, args: UpdateArgs) -> Result<()> {
    let payload = parse_payload(&args.json)?;
    let store = open_store(config).await?;
    let test = store.update(args.position, &payload).await?;
    println!("✏️  Updated position {} to '{}'", args.position, test.name);
    Ok(())
}

pub async fn delete_test(config: &RegistryConfig, args: DeleteArgs) -> Result<()> {
    let store = open_store(config).await?;

    if !args.yes {
        let listing = store.list().await?;
        let target = usize::try_from(args.position)
            .ok()
            .and_then(|index| listing.tests.get(index));
        if let Some(test) = target {
            let prompt = format!("Delete test {} '{}'?", args.position, test.name);
            let stdin = io::stdin();
            let confirmed = confirm(&prompt, &mut stdin.lock(), &mut io::stdout())?;
            if !confirmed {
                println!("Cancelled.");
                return Ok(());
            }
        }
    }

    let removed = store.delete(args.position).await?;
    println!("🗑️  Deleted '{}'", removed.name);
    Ok(())
}

pub async fn export_tests(config: &RegistryConfig, args: ExportArgs) -> Result<()> {
    let store = open_store(config).await?;
    let csv = store.export().await?;

    match args.output {
        Some(path) => {
            write_atomic(&path, csv.as_bytes()).await?;
            info!("Export written to {}", path.display());
            println!("📄 Exported to {}", path.display());
        }
        None => print!("{}", csv),
    }
    Ok(())
}

pub async fn import_tests(config: &RegistryConfig, args: ImportArgs) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.from)
        .await
        .with_context(|| format!("Failed to read {}", args.from.display()))?;
    let decoded = codec::decode(&content);
    let store = open_store(config).await?;

    let mut imported = 0;
    let mut rejected = 0;
    for test in &decoded.tests {
        match store.add(&TestPayload::from(test)).await {
            Ok(_) => imported += 1,
            Err(e) if e.is_client_error() => {
                warn!("Not importing '{}': {}", test.name, e);
                rejected += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!(
        "📥 Imported {} tests into {} ({} rejected, {} malformed rows skipped)",
        imported,
        store.location(),
        rejected,
        decoded.skipped
    );
    Ok(())
}
