//! snaptree CLI Binary
//!
//! Command-line interface for snapshotting directories and detecting changes.

use anyhow::Context;
use clap::Parser;
use snaptree::cli::{Cli, RunContext};
use snaptree::config::ConfigLoader;
use snaptree::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    init_logging(Some(&logging_config)).context("Failed to initialize logging")?;
    info!("snaptree starting");

    let context = RunContext::new(cli.workspace.clone(), cli.config.clone()).map_err(|e| {
        error!("Error initializing workspace: {}", e);
        anyhow::anyhow!(snaptree::cli::map_error(&e))
    })?;

    let output = context.execute(&cli.command).map_err(|e| {
        error!("Command failed: {}", e);
        anyhow::anyhow!(snaptree::cli::map_error(&e))
    })?;
    info!("Command completed successfully");
    println!("{}", output);
    Ok(())
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }
    if config.file.is_relative() {
        config.file = cli.workspace.join(&config.file);
    }

    config
}
