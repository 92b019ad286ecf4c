//! Core configuration parsed from TOML.
//!
//! # Invariants
//! - Every field has a default, so an empty document is a valid config.
//! - `validate` runs on every load path; invalid configs never escape.

use crate::delivery::attachment::DEFAULT_ATTACHMENT_BASE_URL;
use crate::logging::default_log_level;
use crate::service::task_service::DEFAULT_TASKS_KEY;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Where the task snapshot lives.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    /// Key holding the task snapshot.
    pub tasks_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            tasks_key: DEFAULT_TASKS_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploadConfig {
    pub max_files: usize,
    /// Delay between progress steps, in milliseconds.
    pub tick_ms: u64,
    pub base_url: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: 5,
            tick_ms: 200,
            base_url: DEFAULT_ATTACHMENT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoreConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub upload: UploadConfig,
}

impl CoreConfig {
    /// Loads and validates a config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.tasks_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.tasks_key cannot be empty".to_string(),
            ));
        }
        if self.upload.max_files == 0 {
            return Err(ConfigError::Invalid(
                "upload.max_files must be at least 1".to_string(),
            ));
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.storage.tasks_key, "tasks");
        assert_eq!(config.upload.max_files, 5);
        assert_eq!(config.upload.tick_ms, 200);
    }

    #[test]
    fn sections_override_defaults() {
        let config = CoreConfig::from_toml_str(
            r#"
            [storage]
            db_path = "/var/lib/sprintboard/board.db"
            tasks_key = "board.tasks"

            [upload]
            max_files = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.tasks_key, "board.tasks");
        assert!(config.storage.db_path.is_some());
        assert_eq!(config.upload.max_files, 2);
        assert_eq!(config.upload.tick_ms, 200);
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_toml_str("[logging]\ndir = \"logs\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("absolute")));
    }

    #[test]
    fn zero_max_files_is_rejected() {
        let err = CoreConfig::from_toml_str("[upload]\nmax_files = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
