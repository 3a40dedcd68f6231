//! SQL for the migrated-versions table.

use chrono::NaiveDateTime;

use crate::error::{MigrateError, MigrateResult};
use crate::migrate::planner::{Direction, Step};

/// Default ledger table name.
pub const DEFAULT_TABLE: &str = "qail_migration_versions";

/// Stored `executed_at` format (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Statement builder for the ledger table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    table: String,
}

impl Ledger {
    /// `table` may be schema qualified (`audit.versions`).
    pub fn new(table: impl Into<String>) -> MigrateResult<Self> {
        let table = table.into();
        let valid = !table.is_empty()
            && table
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        if !valid {
            return Err(MigrateError::Config(format!(
                "'{}' is not a valid table name",
                table
            )));
        }
        Ok(Self { table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (version VARCHAR(255) NOT NULL PRIMARY KEY, executed_at VARCHAR(32) NOT NULL)",
            self.table
        )
    }

    pub fn select_sql(&self) -> String {
        format!(
            "SELECT version, executed_at FROM {} ORDER BY version ASC",
            self.table
        )
    }

    /// Insert for an applied step, delete for a reverted one.
    pub fn record_sql(&self, step: &Step, executed_at: NaiveDateTime) -> String {
        match step.direction {
            Direction::Apply => format!(
                "INSERT INTO {} (version, executed_at) VALUES ({}, {})",
                self.table,
                quote(step.version.as_str()),
                quote(&executed_at.format(TIMESTAMP_FORMAT).to_string())
            ),
            Direction::Revert => format!(
                "DELETE FROM {} WHERE version = {}",
                self.table,
                quote(step.version.as_str())
            ),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// Parse a stored `executed_at` value.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::version::Version;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn step(raw: &str, direction: Direction) -> Step {
        Step {
            version: Version::parse(raw).unwrap(),
            direction,
        }
    }

    #[test]
    fn test_table_name_validation() {
        assert!(Ledger::new("versions").is_ok());
        assert!(Ledger::new("audit.versions").is_ok());
        assert!(Ledger::new("").is_err());
        assert!(Ledger::new("a.").is_err());
        assert!(Ledger::new("versions; DROP TABLE x").is_err());
    }

    #[test]
    fn test_record_sql() {
        let ledger = Ledger::default();
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(
            ledger.record_sql(&step("20240101", Direction::Apply), at),
            "INSERT INTO qail_migration_versions (version, executed_at) VALUES ('20240101', '2024-01-02 03:04:05')"
        );
        assert_eq!(
            ledger.record_sql(&step("20240101", Direction::Revert), at),
            "DELETE FROM qail_migration_versions WHERE version = '20240101'"
        );
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-02 03:04:05").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
