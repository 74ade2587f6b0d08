//! # Console Configuration
//!
//! ## Load Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Defaults              AppConfig::default()                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. TOML file             --config <path>, or tsk.toml in the          │
//! │       │                   platform config dir (skipped if missing)     │
//! │       ▼                                                                 │
//! │  3. Environment           TSK_DB_PATH, TSK_STORE_NAME, TSK_INTERSTATE  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. validate()                                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business settings that every terminal must agree on (invoice prefix,
//! low stock threshold) live in the database `settings` table, not here.
//!
//! ## Example `tsk.toml`
//! ```toml
//! database_path = "/srv/tsk/tsk.db"
//! store_name = "Sri Lakshmi Silks"
//! is_interstate = false
//! backup_dir = "/srv/tsk/backups"
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tsk_db::DbConfig;

pub const ENV_DB_PATH: &str = "TSK_DB_PATH";
pub const ENV_STORE_NAME: &str = "TSK_STORE_NAME";
pub const ENV_INTERSTATE: &str = "TSK_INTERSTATE";

const CONFIG_FILE: &str = "tsk.toml";
const DATABASE_FILE: &str = "tsk.db";

/// Console configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite file. Default: `tsk.db` in the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Printed at the top of every bill.
    pub store_name: String,

    /// New bills default to IGST instead of CGST + SGST.
    pub is_interstate: bool,

    pub max_connections: u32,

    /// Seconds SQLite waits on a locked database.
    pub busy_timeout_secs: u64,

    /// Where `tsk backup` writes when no path is given.
    /// Default: `backups/` in the platform data directory.
    pub backup_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: None,
            store_name: "TSK Textiles".to_string(),
            is_interstate: false,
            max_connections: 5,
            busy_timeout_secs: 5,
            backup_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the TOML file, then environment overrides.
    ///
    /// An explicit `path` must exist; the default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => AppConfig::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => AppConfig::from_file(&path)?,
                _ => AppConfig::default(),
            },
        };

        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        AppConfig::from_toml(&raw).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }

    /// Applies `TSK_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(name) = lookup(ENV_STORE_NAME) {
            self.store_name = name.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_INTERSTATE) {
            self.is_interstate = parse_bool(&raw)
                .ok_or_else(|| ConfigError::InvalidValue(format!("{}={}", ENV_INTERSTATE, raw)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("store_name must not be empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Resolved database file, creating the data directory when defaulted.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(DATABASE_FILE)),
        }
    }

    pub fn backup_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.backup_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join("backups")),
        }
    }

    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs)))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("in", "tsk", "billing")
}

/// `tsk.toml` in the platform config directory.
///
/// - **Linux**: `~/.config/billing/tsk.toml`
/// - **macOS**: `~/Library/Application Support/in.tsk.billing/tsk.toml`
/// - **Windows**: `%APPDATA%\tsk\billing\config\tsk.toml`
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn data_dir() -> Result<PathBuf, ConfigError> {
    let dirs = project_dirs().ok_or(ConfigError::NoHomeDirectory)?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::Io {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not determine a home directory; set TSK_DB_PATH")]
    NoHomeDirectory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = AppConfig::from_toml(
            r#"
            database_path = "/srv/tsk/tsk.db"
            store_name = "Sri Lakshmi Silks"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/srv/tsk/tsk.db")));
        assert_eq!(config.store_name, "Sri Lakshmi Silks");
        assert_eq!(config.max_connections, 5);
        assert!(!config.is_interstate);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(AppConfig::from_toml("invoice_prefx = \"INV\"").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_of(&[
                (ENV_DB_PATH, "/tmp/other.db"),
                (ENV_STORE_NAME, " Kaveri Handlooms "),
                (ENV_INTERSTATE, "yes"),
            ]))
            .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/other.db")));
        assert_eq!(config.store_name, "Kaveri Handlooms");
        assert!(config.is_interstate);

        assert!(config.apply_env(env_of(&[(ENV_INTERSTATE, "maybe")])).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.store_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsk.toml");
        std::fs::write(&path, "store_name = \"Test Store\"\nmax_connections = 2\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.store_name, "Test Store");
        assert_eq!(config.max_connections, 2);

        assert!(matches!(
            AppConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
