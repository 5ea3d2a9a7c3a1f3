//! Store configuration and backend selection.
//!
//! # Responsibility
//! - Parse the TOML store configuration.
//! - Open the configured backend: SQLite (file or in-memory) or `MemoryStore`.
//!
//! # Invariants
//! - A missing config file yields `StoreConfig::default()` (SQLite in memory).
//! - An opened SQLite handle is always fully migrated.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::default_log_level;
use crate::repo::memory::MemoryStore;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config file: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config file: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Storage backend kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Store configuration, usually read from `filmorate.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite file; `None` opens a private in-memory database.
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads the config file, or defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Configured level, or the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

/// An opened store backend.
#[derive(Debug)]
pub enum StoreHandle {
    Sqlite(Connection),
    Memory(MemoryStore),
}

/// Opens the backend selected by `config`.
pub fn open_store(config: &StoreConfig) -> DbResult<StoreHandle> {
    match config.backend {
        StoreBackend::Memory => Ok(StoreHandle::Memory(MemoryStore::new())),
        StoreBackend::Sqlite => {
            let conn = match &config.database_path {
                Some(path) => open_db(path)?,
                None => open_db_in_memory()?,
            };
            Ok(StoreHandle::Sqlite(conn))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{open_store, ConfigError, StoreBackend, StoreConfig, StoreHandle};
    use std::path::PathBuf;

    #[test]
    fn empty_config_defaults_to_sqlite_in_memory() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.backend, StoreBackend::Sqlite);
        assert!(matches!(
            open_store(&config).unwrap(),
            StoreHandle::Sqlite(_)
        ));
    }

    #[test]
    fn parses_memory_backend_and_logging_fields() {
        let config = StoreConfig::from_toml_str(
            r#"
            backend = "memory"
            log_level = "warn"
            log_dir = "/var/log/filmorate"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.effective_log_level(), "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/filmorate")));
        assert!(matches!(
            open_store(&config).unwrap(),
            StoreHandle::Memory(_)
        ));
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let err = StoreConfig::from_toml_str(r#"backend = "postgres""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_and_falls_back_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = StoreConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(missing, StoreConfig::default());

        let path = dir.path().join("filmorate.toml");
        let db_path = dir.path().join("filmorate.db");
        std::fs::write(
            &path,
            format!("database_path = {:?}\n", db_path.display().to_string()),
        )
        .unwrap();
        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.database_path, Some(db_path.clone()));

        assert!(matches!(
            open_store(&config).unwrap(),
            StoreHandle::Sqlite(_)
        ));
        assert!(db_path.exists());
    }
}
