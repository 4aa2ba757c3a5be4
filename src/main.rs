//! Tarmac - Container CI Pipeline for Flutter Apps
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tarmac::cli::{Cli, Commands};
use tarmac::config::ConfigManager;
use tarmac::error::TarmacResult;
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

async fn run() -> TarmacResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("tarmac=warn"),
        1 => EnvFilter::new("tarmac=info"),
        _ => EnvFilter::new("tarmac=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Completions don't need config loading
    if let Commands::Completions(args) = cli.command {
        return tarmac::cli::commands::completions(args);
    }

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| tarmac::error::TarmacError::io("getting current directory", e))?;
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let config = config_manager.load(local_config_path.as_deref()).await?;

    // Dispatch to command
    match cli.command {
        Commands::Completions(_) => unreachable!("Completions handled above"),
        Commands::Run(args) => tarmac::cli::commands::run(args, &config).await,
        Commands::Jobs(args) => tarmac::cli::commands::jobs(args),
        Commands::Gitlab(args) => tarmac::cli::commands::gitlab(args, &config).await,
        Commands::Status => tarmac::cli::commands::status().await,
        Commands::Config(args) => tarmac::cli::commands::config(args, &config).await,
    }
}
