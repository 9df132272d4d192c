//! Steam Clip Exporter
//!
//! Command-line entry point. Conversions run on a tokio runtime created by the
//! convert command; everything else stays on the main thread.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use clip_exporter::adapters::tracing_log::init_logging;
use clip_exporter::app::container::DefaultAppContainer;
use clip_exporter::cli::{commands, Cli};
use clip_exporter::config_initialization::initialize_settings;

/// Main entry point for the clip exporter
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = initialize_settings(cli.overrides(), cli.config.as_deref())
        .context("Failed to load configuration")?;

    // Held until exit so the log file is flushed
    let _log_guard = init_logging(&settings.log);

    info!("Starting clip exporter {}", env!("CARGO_PKG_VERSION"));

    let container = DefaultAppContainer::new(&settings);
    let success = commands::run(&cli.command, &container, &settings)?;

    info!("Clip exporter finished (success: {})", success);
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
