//! CLI module for the clip exporter
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config_initialization::ConfigOverrides;

pub mod args;
pub mod commands;

pub use args::{CleanupArgs, ConvertArgs, ListArgs, SelectionArgs};

/// Steam Clip Exporter
///
/// Finds Steam game recordings on disk and exports each clip to a single MP4
/// file with FFmpeg, without re-encoding.
#[derive(Parser, Debug)]
#[command(name = "clip-exporter")]
#[command(about = "Export Steam game recordings to MP4")]
#[command(version)]
pub struct Cli {
    /// Output directory for converted files
    #[arg(short, long, global = true, env = "CLIP_EXPORTER_OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    /// Number of parallel conversions
    #[arg(short, long, global = true, env = "CLIP_EXPORTER_WORKERS")]
    pub workers: Option<usize>,

    /// Config file (default: <config dir>/clip-exporter/config.toml)
    #[arg(long, global = true, env = "CLIP_EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CLIP_EXPORTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Console log format (pretty, compact, json)
    #[arg(long, global = true, env = "CLIP_EXPORTER_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Do not write a per-run log file
    #[arg(long, global = true)]
    pub no_log_file: bool,

    /// Never query the Steam store; unknown games get a placeholder name
    #[arg(long, global = true, env = "CLIP_EXPORTER_OFFLINE")]
    pub offline: bool,

    /// FFmpeg binary to use instead of the one on PATH
    #[arg(long, global = true, env = "CLIP_EXPORTER_FFMPEG_PATH")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Directory holding the game name cache
    #[arg(long, global = true, env = "CLIP_EXPORTER_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings given on the command line or through the environment
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            output_dir: self.output.clone(),
            workers: self.workers,
            userdata_path: self.command.selection().and_then(|s| s.userdata_path.clone()),
            ffmpeg_path: self.ffmpeg_path.clone(),
            cache_dir: self.cache_dir.clone(),
            offline: self.offline,
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            no_log_file: self.no_log_file,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List discovered clips, newest first
    List(ListArgs),
    /// Convert clips to MP4
    Convert(ConvertArgs),
    /// Delete source folders whose MP4 already exists
    Cleanup(CleanupArgs),
    /// Show detected Steam userdata folders
    DetectPaths,
}

impl Commands {
    pub fn selection(&self) -> Option<&SelectionArgs> {
        match self {
            Commands::List(args) => Some(&args.selection),
            Commands::Convert(args) => Some(&args.selection),
            Commands::Cleanup(args) => Some(&args.selection),
            Commands::DetectPaths => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MediaType;

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "clip-exporter",
            "convert",
            "--steam-id",
            "12345",
            "--media-type",
            "background",
            "--delete-source",
            "-w",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.workers, Some(3));
        let Commands::Convert(args) = &cli.command else {
            panic!("expected convert");
        };
        assert!(args.delete_source);
        assert_eq!(args.selection.owner_id.as_deref(), Some("12345"));
        assert_eq!(args.selection.media_type, MediaType::Background);
    }

    #[test]
    fn test_userdata_path_reaches_overrides() {
        let cli = Cli::try_parse_from(["clip-exporter", "list", "--userdata-path", "/steam/userdata"])
            .unwrap();
        assert_eq!(
            cli.overrides().userdata_path,
            Some(PathBuf::from("/steam/userdata"))
        );
    }

    #[test]
    fn test_rejects_bad_media_type() {
        assert!(Cli::try_parse_from(["clip-exporter", "list", "--media-type", "sometimes"]).is_err());
    }
}
