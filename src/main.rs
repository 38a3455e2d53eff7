//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `address_status` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use address_status::initialization::init_logger_with;
use address_status::{run_server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load provider credentials from .env when present, so API keys never
    // have to be exported manually during development
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    log::info!(
        "Starting address_status (provider: {}, port: {})",
        config.provider,
        config.port
    );

    if let Err(e) = run_server(config).await {
        eprintln!("address_status error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
