//! Error handling module for the clip exporter

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for exporter operations outside a single clip
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Domain rule or per-item failure surfaced at the top level
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No recording root could be found or the given one is unusable
    #[error("Steam userdata folder not found{}", hint(.0))]
    RootNotFound(Option<PathBuf>),

    /// Async runtime could not be started
    #[error("Failed to start worker runtime: {0}")]
    Runtime(String),

    /// Clip listing could not be rendered as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn hint(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" at {}", path.display()),
        None => ". Use --userdata-path to point at it".to_string(),
    }
}

/// Result type alias for exporter operations
pub type ExporterResult<T> = std::result::Result<T, ExporterError>;
