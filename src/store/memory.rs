//! In-process store, for embedding and tests.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;

use super::{MigrationStore, StepExecution, StepOptions};
use crate::error::MigrateResult;
use crate::migrate::planner::{Direction, Step};
use crate::migrate::set::ExecutedRecord;
use crate::migrate::version::Version;

/// Keeps the ledger in memory and logs every committed step.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    ledger: BTreeMap<Version, ExecutedRecord>,
    history: Vec<(Step, Vec<String>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with these versions already recorded.
    pub fn with_executed(records: impl IntoIterator<Item = ExecutedRecord>) -> Self {
        Self {
            ledger: records.into_iter().map(|r| (r.version.clone(), r)).collect(),
            history: Vec::new(),
        }
    }

    /// Recorded versions, ascending.
    pub fn versions(&self) -> Vec<Version> {
        self.ledger.keys().cloned().collect()
    }

    /// Committed steps with the statements they ran, in order.
    pub fn history(&self) -> &[(Step, Vec<String>)] {
        &self.history
    }
}

impl MigrationStore for MemoryStore {
    async fn executed(&mut self) -> MigrateResult<Vec<ExecutedRecord>> {
        Ok(self.ledger.values().cloned().collect())
    }

    async fn apply(
        &mut self,
        step: &Step,
        statements: &[String],
        options: StepOptions,
    ) -> MigrateResult<StepExecution> {
        let query_times = if options.timing {
            vec![Duration::ZERO; statements.len()]
        } else {
            Vec::new()
        };
        if options.dry_run {
            return Ok(StepExecution { query_times });
        }

        match step.direction {
            Direction::Apply => {
                let at = Utc::now().naive_utc();
                self.ledger.insert(
                    step.version.clone(),
                    ExecutedRecord::new(step.version.clone(), Some(at)),
                );
            }
            Direction::Revert => {
                self.ledger.remove(&step.version);
            }
        }
        self.history.push((step.clone(), statements.to_vec()));
        tracing::trace!("memory store applied {} {}", step.direction, step.version);

        Ok(StepExecution { query_times })
    }
}
