//! `qail-migrate.toml` configuration.
//!
//! ```toml
//! name = "Application Migrations"
//! migrations_dir = "migrations"
//! table = "qail_migration_versions"
//! database_url = "postgres://localhost/app"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, MigrateResult};
use crate::store::ledger::{self, Ledger};

/// File looked up in the working directory.
pub const CONFIG_FILE: &str = "qail-migrate.toml";

/// Settings for one migration project. Built once, then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Shown as a header before each run.
    pub name: String,
    /// Relative paths are resolved against the config file's directory.
    pub migrations_dir: PathBuf,
    /// Ledger table.
    pub table: String,
    pub database_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "Qail Migrations".to_string(),
            migrations_dir: PathBuf::from("migrations"),
            table: ledger::DEFAULT_TABLE.to_string(),
            database_url: None,
        }
    }
}

impl Config {
    /// Load from `explicit`, else the first config file found, else defaults.
    pub fn load(explicit: Option<&Path>) -> MigrateResult<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::locate() {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// `./qail-migrate.toml`, then `<config dir>/qail/migrate.toml`.
    pub fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("qail").join("migrate.toml"))
            .filter(|p| p.is_file())
    }

    pub fn from_file(path: &Path) -> MigrateResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MigrateError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&content, path)?;
        if config.migrations_dir.is_relative() {
            if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.migrations_dir = base.join(&config.migrations_dir);
            }
        }
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML; `origin` is only used in error messages.
    pub fn from_toml(content: &str, origin: &Path) -> MigrateResult<Self> {
        let config: Self = toml::from_str(content).map_err(|source| MigrateError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.ledger()?;
        Ok(config)
    }

    /// Replace the database URL when one is given (flag or environment).
    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.database_url = url;
        }
        self
    }

    pub fn database_url(&self) -> MigrateResult<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            MigrateError::Config(
                "no database URL; set database_url, DATABASE_URL or --database-url".to_string(),
            )
        })
    }

    pub fn ledger(&self) -> MigrateResult<Ledger> {
        Ledger::new(self.table.clone())
    }
}
