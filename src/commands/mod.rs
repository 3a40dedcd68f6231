//! Command implementations behind the CLI.
//!
//! Submodules:
//! - `migrate`: resolve a version, check drift, plan and run
//! - `status`: current position, pending and orphaned migrations

mod migrate;
mod status;

pub use migrate::{migrate, write_sql_destination, MigrateOptions, DRIFT_QUESTION};
pub use status::{print_status, status, StatusReport, VersionState, VersionStatus};
