//! precache - Offline pre-cache shim
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use precache::cli::{Cli, Commands};
use precache::config::ConfigManager;
use precache::error::PrecacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PrecacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("precache=warn"),
        1 => EnvFilter::new("precache=info"),
        _ => EnvFilter::new("precache=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .without_time()
            .init();
    }

    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Install => precache::cli::commands::install(&config_manager, &config).await,
        Commands::Fetch(args) => {
            precache::cli::commands::fetch(args, &config_manager, &config).await
        }
        Commands::Entries(args) => precache::cli::commands::entries(args, &config).await,
        Commands::Config(args) => {
            precache::cli::commands::config(args, &config_manager, &config).await
        }
    }
}
