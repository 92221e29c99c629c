//! Workbench CLI Binary

use anyhow::Context;
use clap::Parser;
use workbench::logging::init_logging;
use workbench::tooling::cli::{load_config_for, Cli, CliContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config_for(&cli).context("Failed to load configuration")?;
    init_logging(Some(&cli.logging_config(&config.logging)))
        .context("Failed to initialize logging")?;

    let context = CliContext::with_config(cli.workspace.clone(), config)
        .context("Error initializing workspace")?;
    let output = context.execute(&cli.command).await?;
    println!("{}", output);
    Ok(())
}
