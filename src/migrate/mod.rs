//! Version resolution, drift detection, planning and execution.
//!
//! Submodules:
//! - `version`: version identifiers and the zero sentinel
//! - `alias`: `latest`/`first`/`prev`/`next`/`current[±N]` grammar
//! - `set`: available vs. executed migrations
//! - `resolver`: token -> version
//! - `drift`: executed versions that are no longer registered
//! - `planner`: ordered apply/revert steps
//! - `gate`: confirmation before destructive work
//! - `runner`: execute, dry-run and write-sql modes

pub mod alias;
pub mod drift;
pub mod gate;
pub mod planner;
pub mod resolver;
pub mod runner;
pub mod set;
pub mod version;

pub use alias::{Alias, Target};
pub use gate::{Answer, ConfirmationGate, FixedGate, ShellGate};
pub use planner::{plan, Direction, ExecutionPlan, Step};
pub use resolver::{resolve, resolve_token};
pub use runner::{MigrationRunner, Mode, Outcome, RunOptions, RunSummary, StepReport};
pub use set::{ExecutedRecord, MigrationSet};
pub use version::Version;
