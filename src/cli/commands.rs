//! Command implementations
//!
//! Each command returns `Ok(true)` when the process should exit successfully.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::container::AppContainer;
use crate::cli::args::{CleanupArgs, ConvertArgs, ListArgs, SelectionArgs};
use crate::cli::Commands;
use crate::config_initialization::Settings;
use crate::domain::model::{BatchResult, CleanupReport, ClipRecording};
use crate::error::{ExporterError, ExporterResult};
use crate::utils::Utils;

const LIST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Dispatch a parsed command
pub fn run(command: &Commands, container: &dyn AppContainer, settings: &Settings) -> Result<bool> {
    match command {
        Commands::List(args) => list(args, container, settings),
        Commands::Convert(args) => convert(args, container, settings),
        Commands::Cleanup(args) => cleanup(args, container, settings),
        Commands::DetectPaths => detect_paths(container),
    }
}

/// Execute the list command
pub fn list(args: &ListArgs, container: &dyn AppContainer, settings: &Settings) -> Result<bool> {
    let clips = discover(&args.selection, container, settings)?;
    if clips.is_empty() {
        println!("No clips found matching the criteria");
        return Ok(false);
    }

    let resolver = container.output_resolver();
    let entries: Vec<ClipListing> = clips
        .iter()
        .enumerate()
        .map(|(i, clip)| ClipListing::new(i + 1, resolver.game_name(clip), clip))
        .collect();

    if args.json {
        println!("{}", render_json(&entries)?);
    } else {
        println!("Found {} clips:", entries.len());
        for entry in &entries {
            println!("{}", entry);
        }
    }

    Ok(true)
}

/// Execute the convert command
pub fn convert(args: &ConvertArgs, container: &dyn AppContainer, settings: &Settings) -> Result<bool> {
    let clips = discover(&args.selection, container, settings)?;
    if clips.is_empty() {
        println!("No clips found matching the criteria");
        return Ok(false);
    }

    let coordinator = container
        .batch_coordinator()
        .context("Cannot start conversions")?;

    info!(
        "Converting {} clips to {}",
        clips.len(),
        settings.output_dir.display()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(coordinator.workers())
        .enable_all()
        .build()
        .map_err(|e| ExporterError::Runtime(e.to_string()))?;

    let started = Instant::now();
    let result = runtime
        .block_on(coordinator.run_batch(clips, &settings.output_dir, args.delete_source))
        .map_err(ExporterError::from)
        .context("Batch aborted")?;

    print_batch_summary(&result, started.elapsed(), args.delete_source);
    Ok(result.all_succeeded())
}

/// Execute the cleanup command
pub fn cleanup(args: &CleanupArgs, container: &dyn AppContainer, settings: &Settings) -> Result<bool> {
    let clips = discover(&args.selection, container, settings)?;
    if clips.is_empty() {
        println!("No clips found matching the criteria");
        return Ok(false);
    }

    let started = Instant::now();
    let report = container
        .cleanup_reconciler()
        .reconcile(&clips, &settings.output_dir);

    print_cleanup_summary(&report, started.elapsed());
    Ok(true)
}

/// Execute the detect-paths command
pub fn detect_paths(container: &dyn AppContainer) -> Result<bool> {
    let roots = container.root_locator().detect_roots();
    if roots.is_empty() {
        println!("No Steam userdata folders found");
        return Ok(false);
    }

    println!("Detected Steam userdata folders:");
    for root in &roots {
        println!("  {}", root.display());
    }
    Ok(true)
}

fn discover(
    selection: &SelectionArgs,
    container: &dyn AppContainer,
    settings: &Settings,
) -> ExporterResult<Vec<ClipRecording>> {
    let roots = recording_roots(settings.userdata_path.as_deref(), container)?;
    Ok(container.scanner().scan(&roots, &selection.scan_filter()))
}

/// The configured userdata folder, or every detected one
fn recording_roots(
    configured: Option<&Path>,
    container: &dyn AppContainer,
) -> ExporterResult<Vec<PathBuf>> {
    if let Some(path) = configured {
        if !path.is_dir() {
            return Err(ExporterError::RootNotFound(Some(path.to_path_buf())));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let roots = container.root_locator().detect_roots();
    if roots.is_empty() {
        return Err(ExporterError::RootNotFound(None));
    }
    for root in &roots {
        info!("Using Steam userdata folder {}", root.display());
    }
    Ok(roots)
}

fn render_json(entries: &[ClipListing]) -> ExporterResult<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// One row of `list` output
#[derive(Debug, Serialize)]
struct ClipListing {
    index: usize,
    game_id: String,
    game_name: String,
    owner_id: String,
    timestamp: Option<String>,
    folder: PathBuf,
}

impl ClipListing {
    fn new(index: usize, game_name: String, clip: &ClipRecording) -> Self {
        Self {
            index,
            game_id: clip.game_id.clone(),
            game_name,
            owner_id: clip.owner_id.clone(),
            timestamp: clip
                .timestamp
                .map(|ts| ts.format(LIST_TIMESTAMP_FORMAT).to_string()),
            folder: clip.folder_path.clone(),
        }
    }
}

impl std::fmt::Display for ClipListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.timestamp {
            Some(ts) => write!(f, "{:>3}. {} - {}", self.index, self.game_name, ts),
            None => write!(
                f,
                "{:>3}. {} - {}",
                self.index,
                self.game_name,
                self.folder
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ),
        }
    }
}

fn print_batch_summary(result: &BatchResult, elapsed: std::time::Duration, delete_source: bool) {
    println!();
    println!("Conversion finished in {}", Utils::format_duration(elapsed));
    println!(
        "Successful: {}/{} ({})",
        result.successful.len(),
        result.total,
        Utils::format_file_size(Utils::total_file_size(&result.outputs))
    );

    if !result.failed.is_empty() {
        println!("Failed: {}", result.failed.len());
        for (folder, message) in &result.failed {
            warn!(clip = %folder.display(), "{}", message);
            println!("  {}: {}", folder.display(), message);
        }
    }

    if delete_source {
        println!("Deleted source folders: {}", result.deleted.len());
    }
}

fn print_cleanup_summary(report: &CleanupReport, elapsed: std::time::Duration) {
    println!();
    println!("Cleanup finished in {}", Utils::format_duration(elapsed));
    println!("Deleted: {}/{}", report.deleted.len(), report.total);

    if !report.skipped.is_empty() {
        println!("Skipped: {}", report.skipped.len());
        for (folder, reason) in &report.skipped {
            println!("  {}: {}", folder.display(), reason);
        }
    }
}
