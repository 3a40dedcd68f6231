//! Migration scripts discovered on disk.
//!
//! A migration is `<version>_<name>.up.sql` plus an optional
//! `<version>_<name>.down.sql` in the migrations directory:
//!
//! ```text
//! migrations/
//!   20240101120000_create_users.up.sql
//!   20240101120000_create_users.down.sql
//!   20240102090000_add_email.up.sql
//! ```

mod split;

pub use split::split_statements;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, MigrateResult};
use crate::migrate::planner::{Direction, Step};
use crate::migrate::version::{self, Version};

const UP_SUFFIX: &str = ".up.sql";
const DOWN_SUFFIX: &str = ".down.sql";

/// One registered migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub version: Version,
    pub name: String,
    pub up: String,
    /// `None` when the migration cannot be reverted.
    pub down: Option<String>,
    pub path: PathBuf,
}

impl MigrationScript {
    pub fn new(version: Version, name: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            up: up.into(),
            down: None,
            path: PathBuf::new(),
        }
    }

    pub fn with_down(mut self, down: impl Into<String>) -> Self {
        self.down = Some(down.into());
        self
    }

    /// Statements issued when running this migration in `direction`.
    pub fn statements(&self, direction: Direction) -> MigrateResult<Vec<String>> {
        match direction {
            Direction::Apply => Ok(split_statements(&self.up)),
            Direction::Revert => self
                .down
                .as_deref()
                .map(split_statements)
                .ok_or_else(|| MigrateError::Irreversible(self.version.to_string())),
        }
    }
}

/// All registered migrations, keyed by version.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    scripts: BTreeMap<Version, MigrationScript>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script. Versions must be unique and not the zero sentinel.
    pub fn add(&mut self, script: MigrationScript) -> MigrateResult<()> {
        if script.version.is_zero() {
            return Err(MigrateError::ReservedVersion(script.version.to_string()));
        }
        if let Some(existing) = self.scripts.get(&script.version) {
            return Err(MigrateError::DuplicateVersion {
                version: script.version.to_string(),
                first: existing.path.clone(),
                second: script.path.clone(),
            });
        }
        self.scripts.insert(script.version.clone(), script);
        Ok(())
    }

    /// Scan a directory for migration scripts.
    ///
    /// A missing directory yields an empty catalog.
    pub fn load(dir: &Path) -> MigrateResult<Self> {
        let mut catalog = Self::new();
        if !dir.exists() {
            tracing::debug!("migrations directory {} does not exist", dir.display());
            return Ok(catalog);
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.retain(|p| p.is_file());
        entries.sort();

        let mut downs: BTreeMap<(Version, String), PathBuf> = BTreeMap::new();

        for path in entries {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(stem) = file_name.strip_suffix(UP_SUFFIX) {
                let Some((version, name)) = parse_stem(stem)? else {
                    tracing::debug!("skipping {}", path.display());
                    continue;
                };
                let up = fs::read_to_string(&path)?;
                let mut script = MigrationScript::new(version, name, up);
                script.path = path;
                catalog.add(script)?;
            } else if let Some(stem) = file_name.strip_suffix(DOWN_SUFFIX) {
                if let Some((version, name)) = parse_stem(stem)? {
                    downs.insert((version, name), path);
                }
            } else {
                tracing::debug!("skipping {}", path.display());
            }
        }

        for ((version, name), path) in downs {
            let script = catalog
                .scripts
                .get_mut(&version)
                .filter(|s| s.name == name)
                .ok_or_else(|| MigrateError::MissingMigration(format!("{}_{}", version, name)))?;
            script.down = Some(fs::read_to_string(&path)?);
        }

        tracing::debug!("loaded {} migrations from {}", catalog.len(), dir.display());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn get(&self, version: &Version) -> Option<&MigrationScript> {
        self.scripts.get(version)
    }

    /// Registered versions, ascending.
    pub fn versions(&self) -> impl Iterator<Item = &Version> + '_ {
        self.scripts.keys()
    }

    /// Statements for a planned step.
    pub fn statements_for(&self, step: &Step) -> MigrateResult<Vec<String>> {
        self.get(&step.version)
            .ok_or_else(|| MigrateError::MissingMigration(step.version.to_string()))?
            .statements(step.direction)
    }
}

/// `20240101120000_create_users` -> (version, name). The name part is optional.
///
/// Stems whose version part is not a valid version are not migrations.
fn parse_stem(stem: &str) -> MigrateResult<Option<(Version, String)>> {
    let (raw, name) = stem.split_once('_').unwrap_or((stem, ""));
    if !version::is_valid(raw) {
        return Ok(None);
    }
    if raw == version::ZERO {
        return Err(MigrateError::ReservedVersion(raw.to_string()));
    }
    Ok(Some((Version::parse(raw)?, name.to_string())))
}
