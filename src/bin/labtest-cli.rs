use anyhow::Result;
use clap::Parser;
use labtest_registry::{
    cli::{execute, Cli},
    logging::{env_filter, LOG_ENV},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `export` without --output stays pipeable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(LOG_ENV, "warn"))
        .init();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}
