//! portico entry point.
//!
//! Logging goes to stderr so JSON command output on stdout stays
//! machine-readable.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use portico_core::AppConfig;

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    tracing::info!(
        db_path = %config.db_path.display(),
        generation = %config.generation,
        "portico starting"
    );

    match &cli.command {
        Command::Install => commands::install::run(&config).await,
        Command::Activate => commands::activate::run(&config).await,
        Command::Get { url, destination } => commands::get::run(&config, url, destination).await,
        Command::Status => commands::status::run(&config).await,
        Command::Prefs { action } => commands::prefs::run(&config, action).await,
    }
}
