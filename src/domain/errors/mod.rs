// Domain errors - Error types for the domain layer

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific error types
///
/// Every variant except `Config` is scoped to a single root, clip, or folder and
/// is captured into that item's outcome instead of aborting a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A recording root could not be read
    #[error("Cannot scan {}: {message}", .path.display())]
    Discovery { path: PathBuf, message: String },

    /// A manifest directory is missing an initialization segment
    #[error("Missing initialization files in {}", .directory.display())]
    Manifest { directory: PathBuf },

    /// A clip folder holds no manifest marker
    #[error("No session.mpd files found in {}", .0.display())]
    NoManifest(PathBuf),

    /// The transcoder failed or produced nothing
    #[error("{0}")]
    Transcoder(String),

    /// Output directory or source folder operation failed
    #[error("{0}")]
    Filesystem(String),

    /// Clip folder name does not follow the naming convention
    #[error("Unrecognized clip folder name: {0}")]
    NameParse(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DomainError {
    pub fn discovery(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        DomainError::Discovery {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn filesystem(context: &str, err: impl std::fmt::Display) -> Self {
        DomainError::Filesystem(format!("{}: {}", context, err))
    }
}
