mod app;
mod backend;
mod catalog;
mod cli;
mod config;
mod db;
mod paths;
mod recent;

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config_path = paths::config_file_path()?;
    let config = AppConfig::load(&config_path)?;
    init_logging(&config)?;
    tracing::info!(config = %config_path.display(), "omnia starting");
    app::run(cli, config, &config_path)
}

/// Logs go to a file so they never tear the TUI; RUST_LOG wins over the
/// configured level.
fn init_logging(config: &AppConfig) -> Result<()> {
    let log_path = paths::log_file_path()?;
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_env_filter(filter)
        .with_ansi(false)
        .init();
    Ok(())
}
