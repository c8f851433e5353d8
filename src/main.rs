//! Triangular arbitrage monitor CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use triarb_config::load_config;
use triarb_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(&cli.config);

    // Setup logging; flags win over the config file
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| logging.level.clone());
    let _log_guard = setup_logging(
        &level,
        cli.json_logs || logging.is_json(),
        logging.file.as_deref().map(Path::new),
    );

    // Execute command
    match cli.command {
        Commands::ValidateConfig(args) => {
            cli::commands::validate::run(args, &cli.config, loaded).await
        }
        Commands::Run(args) => {
            let config = loaded.with_context(|| {
                format!("failed to load configuration from {}", cli.config.display())
            })?;
            cli::commands::run::run(args, config).await
        }
        Commands::CheckConnection(args) => {
            let config = loaded.with_context(|| {
                format!("failed to load configuration from {}", cli.config.display())
            })?;
            cli::commands::check::run(args, config).await
        }
    }
}
