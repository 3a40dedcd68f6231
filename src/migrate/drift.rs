//! Orphaned history: executed versions that are no longer registered.

use std::collections::BTreeSet;

use super::set::{ExecutedRecord, MigrationSet};
use super::version::Version;

/// `executed - available`.
pub fn detect(set: &MigrationSet) -> BTreeSet<Version> {
    set.executed()
        .filter(|v| !set.is_available(v))
        .cloned()
        .collect()
}

/// Orphaned ledger rows, ascending, for warning output.
pub fn orphaned_records(set: &MigrationSet) -> Vec<&ExecutedRecord> {
    set.executed()
        .filter(|v| !set.is_available(v))
        .filter_map(|v| set.record(v))
        .collect()
}

/// Date shown next to an orphaned version: the ledger timestamp when known,
/// otherwise the date encoded in the version itself.
pub fn display_date(record: &ExecutedRecord) -> String {
    match record.executed_at {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => record.version.display_datetime(),
    }
}
