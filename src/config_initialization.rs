//! Configuration initialization and hierarchy management
//!
//! Precedence: CLI flag > environment variable > config file > defaults.
//! Environment variables are folded into the CLI values by clap before they
//! reach this module.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::adapters::toml_config::{FileConfig, TomlConfigAdapter};
use crate::adapters::tracing_log::{parse_log_level, LogFormat, LogSettings};
use crate::app::batch_interactor::default_worker_count;
use crate::domain::errors::DomainError;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub userdata_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub offline: bool,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub no_log_file: bool,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub workers: usize,
    pub userdata_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub offline: bool,
    /// Holds the game name cache
    pub cache_dir: PathBuf,
    pub log: LogSettings,
}

/// Merge overrides over the file config over built-in defaults
pub fn resolve_settings(
    overrides: ConfigOverrides,
    file: FileConfig,
    app_dir: &Path,
) -> Result<Settings, DomainError> {
    let workers = match overrides.workers.or(file.workers) {
        Some(0) => {
            return Err(DomainError::Config(
                "workers must be greater than 0".to_string(),
            ))
        }
        Some(n) => n,
        None => default_worker_count(),
    };

    let level = overrides
        .log_level
        .or(file.log_level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let level = parse_log_level(&level)?;

    let format = match overrides.log_format.or(file.log_format) {
        Some(format) => format.parse::<LogFormat>()?,
        None => LogFormat::default(),
    };

    let log_to_file = !overrides.no_log_file && file.log_to_file.unwrap_or(true);

    let settings = Settings {
        output_dir: overrides
            .output_dir
            .or(file.output_dir)
            .unwrap_or_else(default_output_dir),
        workers,
        userdata_path: overrides.userdata_path.or(file.userdata_path),
        ffmpeg_path: overrides.ffmpeg_path.or(file.ffmpeg_path),
        offline: overrides.offline || file.offline.unwrap_or(false),
        cache_dir: overrides
            .cache_dir
            .or(file.cache_dir)
            .unwrap_or_else(|| app_dir.to_path_buf()),
        log: LogSettings {
            level,
            format,
            log_dir: log_to_file.then(|| app_dir.join("logs")),
        },
    };

    debug!("Resolved settings: {:?}", settings);
    Ok(settings)
}

/// Load the config file (explicit or default location) and resolve settings
pub fn initialize_settings(
    overrides: ConfigOverrides,
    config_file: Option<&Path>,
) -> Result<Settings, DomainError> {
    let file = TomlConfigAdapter::load_or_default(config_file)?;
    resolve_settings(overrides, file, &TomlConfigAdapter::app_dir())
}

/// Desktop on Windows and macOS, Videos on Linux, else the current directory
pub fn default_output_dir() -> PathBuf {
    let preferred = if cfg!(target_os = "linux") {
        dirs::video_dir()
    } else {
        dirs::desktop_dir()
    };

    preferred
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
