//! # qail-migrate
//!
//! Resolve a migration target (a version, an alias such as `latest` or
//! `prev`, or a delta like `current-2`), plan the steps from the current
//! position, and execute them, dry-run them or write them out as SQL.
//!
//! ```
//! use qail_migrate::prelude::*;
//!
//! let v = |s: &str| Version::parse(s).unwrap();
//! let set = MigrationSet::new(
//!     [v("20240101000000"), v("20240102000000"), v("20240103000000")],
//!     [ExecutedRecord::new(v("20240101000000"), None)],
//! );
//!
//! let target = resolve_token("latest", &set).unwrap();
//! let plan = plan(&set, &set.current(), &target);
//! assert_eq!(plan.len(), 2);
//! assert_eq!(plan.direction(), Some(Direction::Apply));
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod migrate;
pub mod source;
pub mod store;
pub mod writer;

pub use config::Config;
pub use error::{MigrateError, MigrateResult, ResolveError};

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Boundary, MigrateError, MigrateResult, ResolveError};
    pub use crate::migrate::{
        plan, resolve, resolve_token, Alias, Answer, ConfirmationGate, Direction,
        ExecutedRecord, ExecutionPlan, FixedGate, MigrationRunner, MigrationSet, Mode, Outcome,
        RunOptions, RunSummary, ShellGate, Step, Target, Version,
    };
    pub use crate::source::{Catalog, MigrationScript};
    pub use crate::store::{Ledger, MemoryStore, MigrationStore, SqlStore};
}
