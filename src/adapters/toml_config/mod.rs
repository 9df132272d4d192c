// TOML config adapter - Configuration file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::domain::errors::DomainError;

/// Directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "clip-exporter";

/// Values accepted in the `[exporter]` table; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub output_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub userdata_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub offline: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_to_file: Option<bool>,
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    exporter: FileConfig,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Per-user application directory (config file, name cache, logs)
    pub fn app_dir() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    /// Default config file location
    pub fn default_config_path() -> PathBuf {
        Self::app_dir().join("config.toml")
    }

    /// Parse a config document
    pub fn parse(content: &str) -> Result<FileConfig, DomainError> {
        let document: ConfigDocument = toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))?;
        Ok(document.exporter)
    }

    /// Load a config file that must exist
    pub fn load(path: &Path) -> Result<FileConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load an explicit config file, or the default one when present
    pub fn load_or_default(explicit: Option<&Path>) -> Result<FileConfig, DomainError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Self::default_config_path();
                if path.is_file() {
                    Self::load(&path)
                } else {
                    Ok(FileConfig::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_exporter_table() {
        let config = TomlConfigAdapter::parse(
            r#"
            [exporter]
            output_dir = "/videos"
            workers = 3
            offline = true
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, Some(PathBuf::from("/videos")));
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.offline, Some(true));
        assert_eq!(config.log_format.as_deref(), Some("json"));
        assert_eq!(config.userdata_path, None);
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(TomlConfigAdapter::parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = TomlConfigAdapter::parse("[exporter]\nworkerz = 3\n").unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(TomlConfigAdapter::load_or_default(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[exporter]\nworkers = 2\n").unwrap();
        let config = TomlConfigAdapter::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.workers, Some(2));
    }
}
