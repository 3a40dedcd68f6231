//! `migrate [version]`

use std::path::{Path, PathBuf};

use colored::*;

use crate::config::Config;
use crate::error::{MigrateError, MigrateResult};
use crate::migrate::alias::Target;
use crate::migrate::gate::ConfirmationGate;
use crate::migrate::runner::{Mode, MigrationRunner, Outcome, RunOptions, RunSummary};
use crate::migrate::set::MigrationSet;
use crate::migrate::{drift, planner, resolver};
use crate::source::Catalog;
use crate::store::MigrationStore;

/// Asked when the ledger holds versions that are no longer registered.
pub const DRIFT_QUESTION: &str = "Are you sure you wish to continue?";

/// Options of one `migrate` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateOptions {
    /// Version or alias; `latest` by default.
    pub version: String,
    /// Set when SQL should be written instead of executed.
    pub write_sql: Option<PathBuf>,
    pub dry_run: bool,
    pub query_time: bool,
    pub allow_no_migration: bool,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            version: "latest".to_string(),
            write_sql: None,
            dry_run: false,
            query_time: false,
            allow_no_migration: false,
        }
    }
}

impl MigrateOptions {
    /// write-sql wins over dry-run.
    pub fn mode(&self) -> Mode {
        match &self.write_sql {
            Some(path) => Mode::WriteSql(path.clone()),
            None if self.dry_run => Mode::DryRun,
            None => Mode::Execute,
        }
    }
}

/// `--write-sql` without a value writes into the working directory.
pub fn write_sql_destination(flag: Option<Option<PathBuf>>, cwd: &Path) -> Option<PathBuf> {
    flag.map(|path| path.unwrap_or_else(|| cwd.to_path_buf()))
}

/// Resolve, check for drift, plan and run.
///
/// Nothing is planned or run when the version cannot be resolved or the
/// operator declines to continue past orphaned history.
pub async fn migrate<S: MigrationStore>(
    config: &Config,
    catalog: &Catalog,
    store: &mut S,
    options: &MigrateOptions,
    gate: &mut dyn ConfirmationGate,
) -> MigrateResult<RunSummary> {
    print_header(config);

    let ledger = config.ledger()?;
    let set = MigrationSet::new(catalog.versions().cloned(), store.executed().await?);

    let target = resolver::resolve(&Target::parse(&options.version), &set)?;

    let orphaned = drift::orphaned_records(&set);
    if !orphaned.is_empty() {
        println!(
            "{}",
            format!(
                "WARNING! You have {} previously executed migrations in the database that are not registered migrations.",
                orphaned.len()
            )
            .red()
            .bold()
        );
        for record in &orphaned {
            println!(
                "    {} {} ({})",
                ">>".yellow(),
                drift::display_date(record),
                record.version.to_string().yellow()
            );
        }
        if !gate.ask(DRIFT_QUESTION).proceeds() {
            return Err(MigrateError::UserCancelled);
        }
    }

    let current = set.current();
    let plan = planner::plan(&set, &current, &target);
    tracing::debug!(
        current = %current,
        target = %target,
        steps = plan.len(),
        "planned migration"
    );

    let run_options = RunOptions {
        timing: options.query_time,
        allow_empty: options.allow_no_migration,
    };
    let outcome = MigrationRunner::new(store, catalog, &ledger)
        .run(plan, &options.mode(), run_options, gate)
        .await?;

    match outcome {
        Outcome::Success(summary) => Ok(summary),
        Outcome::Cancelled => Err(MigrateError::UserCancelled),
        Outcome::NoMigrationAvailable => Err(MigrateError::NoMigrationAvailable),
    }
}

fn print_header(config: &Config) {
    println!();
    println!("{}", config.name.cyan().bold());
    println!("{}", "=".repeat(config.name.chars().count()).cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mode_precedence() {
        let mut options = MigrateOptions::default();
        assert_eq!(options.mode(), Mode::Execute);
        options.dry_run = true;
        assert_eq!(options.mode(), Mode::DryRun);
        options.write_sql = Some(PathBuf::from("out.sql"));
        assert_eq!(options.mode(), Mode::WriteSql(PathBuf::from("out.sql")));
    }

    #[test]
    fn test_write_sql_defaults_to_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(write_sql_destination(None, cwd), None);
        assert_eq!(write_sql_destination(Some(None), cwd), Some(PathBuf::from("/work")));
        assert_eq!(
            write_sql_destination(Some(Some(PathBuf::from("a.sql"))), cwd),
            Some(PathBuf::from("a.sql"))
        );
    }
}
