//! Where migrations are applied and the ledger lives.

pub mod ledger;
mod memory;
mod sql;

pub use ledger::Ledger;
pub use memory::MemoryStore;
pub use sql::SqlStore;

use std::time::Duration;

use crate::error::MigrateResult;
use crate::migrate::planner::Step;
use crate::migrate::set::ExecutedRecord;

/// How a single step is run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOptions {
    /// Report the statements without running them or touching the ledger.
    pub dry_run: bool,
    /// Time every statement.
    pub timing: bool,
}

/// What running a step produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepExecution {
    /// One entry per statement, only when timing was requested.
    pub query_times: Vec<Duration>,
}

/// A database that can run migration steps and remembers which ran.
///
/// Steps are applied one at a time, in the order given.
#[allow(async_fn_in_trait)]
pub trait MigrationStore {
    /// Ledger rows, in any order.
    async fn executed(&mut self) -> MigrateResult<Vec<ExecutedRecord>>;

    /// Run one step's statements and record it in the ledger atomically.
    async fn apply(
        &mut self,
        step: &Step,
        statements: &[String],
        options: StepOptions,
    ) -> MigrateResult<StepExecution>;
}
