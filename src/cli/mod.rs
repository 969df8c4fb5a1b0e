//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use std::process::ExitCode;

use anyhow::Result;
use tracing::error;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;

/// Exit status after an interrupt (128 + SIGINT).
pub const EXIT_INTERRUPTED: u8 = 130;

/// Load configuration, install logging and run the selected command.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ConfigLoader::load(cli.config.as_deref())?;
    let _logger = LoggerImpl::init(&config)?;

    match dispatch(cli.command, &config, cli.json).await {
        Ok(code) => Ok(code),
        Err(err) => {
            error!(error = format!("{err:#}"), "Command failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn dispatch(command: Commands, config: &Config, json_mode: bool) -> Result<ExitCode> {
    match command {
        Commands::Crawl(args) => commands::crawl::execute(args, config, json_mode).await,
        Commands::Stats(args) => commands::stats::execute(args, config, json_mode)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Export(args) => commands::export::execute(args, config, json_mode)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Report(args) => commands::report::execute(args, config, json_mode)
            .await
            .map(|()| ExitCode::SUCCESS),
    }
}
