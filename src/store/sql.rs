//! sqlx-backed store (PostgreSQL and SQLite through the `Any` driver).

use std::time::{Duration, Instant};

use chrono::Utc;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Row};

use super::ledger::{parse_timestamp, Ledger};
use super::{MigrationStore, StepExecution, StepOptions};
use crate::error::{MigrateError, MigrateResult};
use crate::migrate::planner::Step;
use crate::migrate::set::ExecutedRecord;
use crate::migrate::version::Version;

/// Runs each step in its own transaction together with its ledger update.
///
/// The ledger table is created by the first step that really runs, so dry
/// runs and write-sql leave a fresh database untouched.
pub struct SqlStore {
    pool: AnyPool,
    ledger: Ledger,
    ledger_ready: bool,
}

impl SqlStore {
    /// Connect without touching the schema.
    pub async fn connect(url: &str, ledger: Ledger) -> MigrateResult<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await?;

        Ok(Self {
            pool,
            ledger,
            ledger_ready: false,
        })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Create the ledger table if it does not exist yet.
    pub async fn ensure_ledger(&mut self) -> MigrateResult<()> {
        if self.ledger_ready {
            return Ok(());
        }
        sqlx::query(&self.ledger.create_table_sql())
            .execute(&self.pool)
            .await?;
        tracing::debug!("ledger table {} ready", self.ledger.table());
        self.ledger_ready = true;
        Ok(())
    }
}

/// PostgreSQL reports `42P01`; SQLite only has the message.
fn is_missing_table(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("42P01")
                || db.message().contains("no such table")
        }
        _ => false,
    }
}

impl MigrationStore for SqlStore {
    async fn executed(&mut self) -> MigrateResult<Vec<ExecutedRecord>> {
        let rows = match sqlx::query(&self.ledger.select_sql())
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) if !self.ledger_ready && is_missing_table(&e) => {
                tracing::debug!("ledger table {} does not exist yet", self.ledger.table());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let version: String = row.try_get("version")?;
            let executed_at: String = row.try_get("executed_at")?;

            let parsed = parse_timestamp(&executed_at);
            if parsed.is_none() {
                tracing::warn!(
                    "unreadable executed_at '{}' for version {} in {}",
                    executed_at,
                    version,
                    self.ledger.table()
                );
            }
            records.push(ExecutedRecord::new(Version::parse(&version)?, parsed));
        }

        Ok(records)
    }

    async fn apply(
        &mut self,
        step: &Step,
        statements: &[String],
        options: StepOptions,
    ) -> MigrateResult<StepExecution> {
        let mut query_times = Vec::new();

        if options.dry_run {
            for sql in statements {
                tracing::debug!(version = %step.version, "dry run: {}", sql);
            }
            return Ok(StepExecution { query_times });
        }

        let step_error = |source: sqlx::Error| MigrateError::Step {
            version: step.version.to_string(),
            source,
        };

        self.ensure_ledger().await?;

        // dropped without commit on error, which rolls back
        let mut tx = self.pool.begin().await?;

        for sql in statements {
            tracing::debug!(version = %step.version, "{}", sql);
            let started = Instant::now();
            sqlx::query(sql.as_str())
                .execute(&mut *tx)
                .await
                .map_err(step_error)?;
            if options.timing {
                query_times.push(started.elapsed());
            }
        }

        let record = self.ledger.record_sql(step, Utc::now().naive_utc());
        sqlx::query(&record)
            .execute(&mut *tx)
            .await
            .map_err(step_error)?;

        tx.commit().await.map_err(step_error)?;

        Ok(StepExecution { query_times })
    }
}
