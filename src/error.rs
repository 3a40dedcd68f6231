//! Error types for version resolution and migration runs.

use std::path::PathBuf;

use thiserror::Error;

/// Why a version token could not be turned into a concrete version.
///
/// All of these are raised before any migration work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The token is neither a known version nor an alias.
    #[error("Unknown version: {0}")]
    UnknownVersion(String),
    /// `prev` at the first migration or `next` at the latest one.
    #[error("Already at {0} version.")]
    BoundaryReached(Boundary),
    /// `current+N` / `current-N` walked past either end.
    #[error("The delta couldn't be reached.")]
    DeltaUnreachable(i64),
    /// An alias was resolved against an empty set of migrations.
    #[error("No migrations are available.")]
    EmptySet,
}

/// Which end of the migration list was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    First,
    Latest,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Boundary::First => write!(f, "first"),
            Boundary::Latest => write!(f, "latest"),
        }
    }
}

/// Errors surfaced by a migration command.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The operator declined a confirmation question.
    #[error("Migration cancelled!")]
    UserCancelled,

    /// The plan was empty and empty runs were not allowed.
    #[error("Could not find any migrations to execute.")]
    NoMigrationAvailable,

    #[error("Invalid version '{0}': versions are non-empty ASCII alphanumeric strings")]
    InvalidVersion(String),

    #[error("Version {0} is reserved")]
    ReservedVersion(String),

    #[error("Duplicate migration version {version}: {first} and {second}")]
    DuplicateVersion {
        version: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Migration {0} is not registered")]
    MissingMigration(String),

    #[error("Migration {0} has no down script and cannot be reverted")]
    Irreversible(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Migration {version} failed: {source}")]
    Step {
        version: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrateError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Result type used across the crate.
pub type MigrateResult<T> = Result<T, MigrateError>;
