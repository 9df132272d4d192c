// Tracing log adapter - Subscriber setup for console and per-run log files

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::domain::errors::DomainError;

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(DomainError::Config(format!(
                "Invalid log format: {}. Valid formats: pretty, compact, json",
                other
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Compact => f.write_str("compact"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Validate a log level name
pub fn parse_log_level(level: &str) -> Result<String, DomainError> {
    match level.to_lowercase().as_str() {
        lvl @ ("trace" | "debug" | "info" | "warn" | "error") => Ok(lvl.to_string()),
        _ => Err(DomainError::Config(format!(
            "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
            level
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    /// Directory receiving one timestamped log file per run
    pub log_dir: Option<PathBuf>,
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `settings.level`. The returned guard must
/// be held until exit so buffered file output is flushed.
pub fn init_logging(settings: &LogSettings) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    layers.push(match settings.format {
        LogFormat::Pretty => console.boxed(),
        LogFormat::Compact => console.compact().boxed(),
        LogFormat::Json => console.json().boxed(),
    });

    let mut guard = None;
    if let Some(dir) = &settings.log_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let file_name = format!("{}.log", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
                let appender = tracing_appender::rolling::never(dir, file_name);
                let (writer, worker_guard) = tracing_appender::non_blocking(appender);
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .boxed(),
                );
                guard = Some(worker_guard);
            }
            Err(e) => eprintln!("Cannot create log directory {}: {}", dir.display(), e),
        }
    }

    let subscriber = tracing_subscriber::registry().with(layers).with(env_filter);

    // Already installed (tests, repeated init) is not an error
    let _ = tracing::subscriber::set_global_default(subscriber);
    guard
}
