// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod records;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Lab Test Registry CLI
#[derive(Parser, Debug)]
#[command(name = "labtest-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Offline tools for the lab test registry store", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub storage: records::StorageArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stored tests in order
    List(records::ListArgs),

    /// Add a test from a JSON payload
    Add(records::AddArgs),

    /// Replace the test at a position
    Update(records::UpdateArgs),

    /// Delete the test at a position (asks for confirmation)
    Delete(records::DeleteArgs),

    /// Write the spreadsheet export
    Export(records::ExportArgs),

    /// Append every test from a CSV document to the configured store
    Import(records::ImportArgs),

    /// Print version information
    Version,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.storage.resolve()?;
    match cli.command {
        Commands::List(args) => records::list_tests(&config, args).await,
        Commands::Add(args) => records::add_test(&config, args).await,
        Commands::Update(args) => records::update_test(&config, args).await,
        Commands::Delete(args) => records::delete_test(&config, args).await,
        Commands::Export(args) => records::export_tests(&config, args).await,
        Commands::Import(args) => records::import_tests(&config, args).await,
        Commands::Version => {
            println!(
                "{}",
                serde_json::to_string_pretty(&crate::version::get_version_info())?
            );
            Ok(())
        }
    }
}
