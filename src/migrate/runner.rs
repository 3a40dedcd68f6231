//! Drive a plan through execute, dry-run or write-sql.
//!
//! Confirmation happens once, before any step runs. After that the run goes
//! to completion or stops at the first failing step.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use colored::*;

use super::gate::ConfirmationGate;
use super::planner::{Direction, ExecutionPlan, Step};
use crate::error::MigrateResult;
use crate::source::Catalog;
use crate::store::{Ledger, MigrationStore, StepOptions};
use crate::writer;

/// Asked before executing a non-dry run.
pub const EXECUTE_QUESTION: &str = "WARNING! You are about to execute a database migration that could result in schema changes and data loss. Are you sure you wish to continue?";

/// How to carry out the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Apply against the store, after confirmation.
    Execute,
    /// Walk the steps without committing anything.
    DryRun,
    /// Render the statements to a file (or a directory) instead.
    WriteSql(PathBuf),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Measure each step and each query.
    pub timing: bool,
    /// An empty plan is a success rather than [`Outcome::NoMigrationAvailable`].
    pub allow_empty: bool,
}

/// Report for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub statements: Vec<String>,
    /// Only recorded with [`RunOptions::timing`].
    pub elapsed: Option<Duration>,
    pub query_times: Vec<Duration>,
}

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: Vec<StepReport>,
    pub elapsed: Duration,
    /// Set in write-sql mode.
    pub sql_file: Option<PathBuf>,
}

impl RunSummary {
    pub fn query_count(&self) -> usize {
        self.steps.iter().map(|s| s.statements.len()).sum()
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(RunSummary),
    /// The confirmation gate said no; nothing was applied.
    Cancelled,
    /// Nothing to do and empty runs were not allowed.
    NoMigrationAvailable,
}

/// Runs plans against a store using scripts from a catalog.
pub struct MigrationRunner<'a, S> {
    store: &'a mut S,
    catalog: &'a Catalog,
    ledger: &'a Ledger,
}

impl<'a, S: MigrationStore> MigrationRunner<'a, S> {
    pub fn new(store: &'a mut S, catalog: &'a Catalog, ledger: &'a Ledger) -> Self {
        Self {
            store,
            catalog,
            ledger,
        }
    }

    /// Consume the plan in the given mode.
    ///
    /// Every step's statements are rendered before anything else happens, so
    /// an irreversible or unknown migration fails the run up front.
    pub async fn run(
        &mut self,
        plan: ExecutionPlan,
        mode: &Mode,
        options: RunOptions,
        gate: &mut dyn ConfirmationGate,
    ) -> MigrateResult<Outcome> {
        let rendered = plan
            .steps()
            .iter()
            .map(|step| {
                self.catalog
                    .statements_for(step)
                    .map(|statements| (step.clone(), statements))
            })
            .collect::<MigrateResult<Vec<_>>>()?;

        // nothing destructive to confirm
        if plan.is_empty() {
            return Ok(if options.allow_empty {
                println!("{}", "No migrations to execute.".yellow());
                Outcome::Success(RunSummary::default())
            } else {
                Outcome::NoMigrationAvailable
            });
        }

        if *mode == Mode::Execute && !gate.ask(EXECUTE_QUESTION).proceeds() {
            return Ok(Outcome::Cancelled);
        }

        match mode {
            Mode::WriteSql(path) => {
                let started = Instant::now();
                let file = writer::write_sql_file(path, &plan, &rendered, self.ledger)?;
                println!(
                    "{} Wrote {} migration(s) to {}",
                    "✓".green(),
                    rendered.len(),
                    file.display().to_string().cyan()
                );
                Ok(Outcome::Success(RunSummary {
                    steps: rendered
                        .into_iter()
                        .map(|(step, statements)| StepReport {
                            step,
                            statements,
                            elapsed: None,
                            query_times: Vec::new(),
                        })
                        .collect(),
                    elapsed: started.elapsed(),
                    sql_file: Some(file),
                }))
            }
            Mode::Execute | Mode::DryRun => {
                let step_options = StepOptions {
                    dry_run: *mode == Mode::DryRun,
                    timing: options.timing,
                };
                self.execute(&plan, rendered, step_options).await
            }
        }
    }

    async fn execute(
        &mut self,
        plan: &ExecutionPlan,
        rendered: Vec<(Step, Vec<String>)>,
        options: StepOptions,
    ) -> MigrateResult<Outcome> {
        let verb = if options.dry_run {
            "Executing dry run of migration"
        } else {
            "Migrating"
        };
        let direction = match plan.direction() {
            Some(Direction::Revert) => "down",
            _ => "up",
        };
        println!(
            "{} {} to {} from {}",
            verb,
            direction.yellow(),
            plan.to().to_string().yellow(),
            plan.from().to_string().yellow()
        );
        println!();

        let started = Instant::now();
        let mut reports = Vec::with_capacity(rendered.len());

        for (step, statements) in rendered {
            let label = match step.direction {
                Direction::Apply => "++ migrating".green(),
                Direction::Revert => "-- reverting".red(),
            };
            println!("  {} {}", label, step.version.to_string().yellow());
            tracing::info!(version = %step.version, direction = %step.direction, "running step");

            let step_started = Instant::now();
            let execution = self.store.apply(&step, &statements, options).await?;
            let elapsed = step_started.elapsed();

            for (i, sql) in statements.iter().enumerate() {
                match execution.query_times.get(i) {
                    Some(t) if options.timing => {
                        println!("     {} {} {}", "->".dimmed(), sql, format_duration(*t).dimmed())
                    }
                    _ => println!("     {} {}", "->".dimmed(), sql),
                }
            }
            if statements.is_empty() {
                println!(
                    "     {}",
                    format!("Migration {} did not result in any SQL statements.", step.version)
                        .yellow()
                );
            }

            let done = match step.direction {
                Direction::Apply => "++ migrated",
                Direction::Revert => "-- reverted",
            };
            if options.timing {
                println!("  {} (took {})", done, format_duration(elapsed));
            } else {
                println!("  {}", done);
            }
            println!();

            reports.push(StepReport {
                step,
                statements,
                elapsed: options.timing.then_some(elapsed),
                query_times: execution.query_times,
            });
        }

        let summary = RunSummary {
            steps: reports,
            elapsed: started.elapsed(),
            sql_file: None,
        };

        println!("  {}", "------------------------".dimmed());
        println!("  ++ finished in {}", format_duration(summary.elapsed));
        println!("  ++ {} migrations executed", summary.steps.len());
        println!("  ++ {} sql queries", summary.query_count());

        Ok(Outcome::Success(summary))
    }
}

fn format_duration(d: Duration) -> String {
    format!("{:.1}ms", d.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::migrate::gate::{Answer, FixedGate};
    use crate::migrate::planner::plan;
    use crate::migrate::set::{ExecutedRecord, MigrationSet};
    use crate::migrate::version::Version;
    use crate::source::MigrationScript;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    /// Counts how often it was asked.
    struct CountingGate {
        answer: Answer,
        asked: usize,
    }

    impl ConfirmationGate for CountingGate {
        fn ask(&mut self, _question: &str) -> Answer {
            self.asked += 1;
            self.answer
        }
    }

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for (raw, table) in [("1", "a"), ("2", "b"), ("3", "c")] {
            catalog
                .add(
                    MigrationScript::new(v(raw), table, format!("CREATE TABLE {} (id INT);", table))
                        .with_down(format!("DROP TABLE {};", table)),
                )
                .unwrap();
        }
        catalog
    }

    fn executed(raws: &[&str]) -> Vec<ExecutedRecord> {
        raws.iter().map(|r| ExecutedRecord::new(v(r), None)).collect()
    }

    fn plan_to(catalog: &Catalog, applied: &[&str], target: &str) -> ExecutionPlan {
        let set = MigrationSet::new(catalog.versions().cloned(), executed(applied));
        plan(&set, &set.current(), &v(target))
    }

    #[tokio::test]
    async fn test_execute_applies_in_order() {
        let catalog = catalog();
        let ledger = Ledger::default();
        let mut store = MemoryStore::new();
        let mut gate = CountingGate { answer: Answer::Yes, asked: 0 };

        let outcome = MigrationRunner::new(&mut store, &catalog, &ledger)
            .run(plan_to(&catalog, &[], "3"), &Mode::Execute, RunOptions::default(), &mut gate)
            .await
            .unwrap();

        assert_eq!(gate.asked, 1);
        let Outcome::Success(summary) = outcome else {
            panic!("expected success");
        };
        assert_eq!(summary.steps.len(), 3);
        assert_eq!(store.versions(), vec![v("1"), v("2"), v("3")]);
        let order: Vec<_> = store.history().iter().map(|(s, _)| s.version.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_revert_runs_descending() {
        let catalog = catalog();
        let ledger = Ledger::default();
        let mut store = MemoryStore::with_executed(executed(&["1", "2", "3"]));

        MigrationRunner::new(&mut store, &catalog, &ledger)
            .run(
                plan_to(&catalog, &["1", "2", "3"], "1"),
                &Mode::Execute,
                RunOptions::default(),
                &mut FixedGate(Answer::Bypassed),
            )
            .await
            .unwrap();

        let order: Vec<_> = store.history().iter().map(|(s, _)| s.version.as_str()).collect();
        assert_eq!(order, vec!["3", "2"]);
        assert_eq!(store.versions(), vec![v("1")]);
        assert_eq!(store.history()[0].1, vec!["DROP TABLE c".to_string()]);
    }

    #[tokio::test]
    async fn test_declined_gate_applies_nothing() {
        let catalog = catalog();
        let ledger = Ledger::default();
        let mut store = MemoryStore::new();

        let outcome = MigrationRunner::new(&mut store, &catalog, &ledger)
            .run(
                plan_to(&catalog, &[], "3"),
                &Mode::Execute,
                RunOptions::default(),
                &mut FixedGate(Answer::No),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert!(store.history().is_empty());
        assert!(store.versions().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_never_asks_or_records() {
        let catalog = catalog();
        let ledger = Ledger::default();
        let mut store = MemoryStore::with_executed(executed(&["1"]));
        let mut gate = CountingGate { answer: Answer::No, asked: 0 };

        let outcome = MigrationRunner::new(&mut store, &catalog, &ledger)
            .run(
                plan_to(&catalog, &["1"], "3"),
                &Mode::DryRun,
                RunOptions { timing: true, allow_empty: false },
                &mut gate,
            )
            .await
            .unwrap();

        assert_eq!(gate.asked, 0);
        let Outcome::Success(summary) = outcome else {
            panic!("expected success");
        };
        assert_eq!(summary.steps.len(), 2);
        assert!(summary.steps.iter().all(|s| s.elapsed.is_some()));
        assert_eq!(store.versions(), vec![v("1")]);
        assert!(store.history().is_empty());
    }

    #[tokio::test]
    async fn test_empty_plan_never_asks() {
        let catalog = catalog();
        let ledger = Ledger::default();
        let mut store = MemoryStore::with_executed(executed(&["1", "2", "3"]));
        let mut gate = CountingGate { answer: Answer::Yes, asked: 0 };

        let outcome = MigrationRunner::new(&mut store, &catalog, &ledger)
            .run(
                plan_to(&catalog, &["1", "2", "3"], "3"),
                &Mode::Execute,
                RunOptions::default(),
                &mut gate,
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::NoMigrationAvailable);

        let outcome = MigrationRunner::new(&mut store, &catalog, &ledger)
            .run(
                plan_to(&catalog, &["1", "2", "3"], "3"),
                &Mode::Execute,
                RunOptions { timing: false, allow_empty: true },
                &mut gate,
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Success(RunSummary::default()));
        assert_eq!(gate.asked, 0);
        assert!(store.history().is_empty());
    }

    #[tokio::test]
    async fn test_irreversible_fails_before_asking() {
        let mut catalog = Catalog::new();
        catalog
            .add(MigrationScript::new(v("1"), "a", "CREATE TABLE a (id INT);"))
            .unwrap();
        let ledger = Ledger::default();
        let mut store = MemoryStore::with_executed(executed(&["1"]));
        let mut gate = CountingGate { answer: Answer::Yes, asked: 0 };

        let err = MigrationRunner::new(&mut store, &catalog, &ledger)
            .run(
                plan_to(&catalog, &["1"], "0"),
                &Mode::Execute,
                RunOptions::default(),
                &mut gate,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MigrateError::Irreversible(_)));
        assert_eq!(gate.asked, 0);
        assert_eq!(store.versions(), vec![v("1")]);
    }

    #[tokio::test]
    async fn test_write_sql_touches_nothing() {
        let catalog = catalog();
        let ledger = Ledger::default();
        let mut store = MemoryStore::new();
        let dir = tempfile::tempdir().unwrap();
        let mut gate = CountingGate { answer: Answer::No, asked: 0 };

        let outcome = MigrationRunner::new(&mut store, &catalog, &ledger)
            .run(
                plan_to(&catalog, &[], "2"),
                &Mode::WriteSql(dir.path().to_path_buf()),
                RunOptions::default(),
                &mut gate,
            )
            .await
            .unwrap();

        let Outcome::Success(summary) = outcome else {
            panic!("expected success");
        };
        let file = summary.sql_file.unwrap();
        assert!(file.starts_with(dir.path()));
        let sql = std::fs::read_to_string(file).unwrap();
        assert!(sql.contains("CREATE TABLE a (id INT);"));
        assert!(sql.contains("CREATE TABLE b (id INT);"));
        assert!(!sql.contains("CREATE TABLE c"));
        assert_eq!(gate.asked, 0);
        assert!(store.history().is_empty());
    }
}
