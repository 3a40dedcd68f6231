//! Render a plan as a SQL file instead of running it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};

use crate::error::MigrateResult;
use crate::migrate::planner::{ExecutionPlan, Step};
use crate::store::Ledger;

/// Where the SQL goes: `path` itself, or a generated file inside it when it
/// is an existing directory.
pub fn destination(path: &Path, now: NaiveDateTime) -> PathBuf {
    if path.is_dir() {
        path.join(format!("qail_migration_{}.sql", now.format("%Y%m%d%H%M%S")))
    } else {
        path.to_path_buf()
    }
}

/// File contents for the plan. `steps` pairs each planned step with its
/// statements, in plan order.
pub fn render(
    plan: &ExecutionPlan,
    steps: &[(Step, Vec<String>)],
    ledger: &Ledger,
    now: NaiveDateTime,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "-- Qail Migration File Generated on {}\n",
        now.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!(
        "-- Migrating from {} to {}\n",
        plan.from(),
        plan.to()
    ));

    for (step, statements) in steps {
        out.push_str(&format!("\n-- Version {} ({})\n", step.version, step.direction));
        for sql in statements {
            out.push_str(sql);
            out.push_str(";\n");
        }
        out.push_str(&ledger.record_sql(step, now));
        out.push_str(";\n");
    }

    out
}

/// Write the rendered plan and return the file written.
pub fn write_sql_file(
    path: &Path,
    plan: &ExecutionPlan,
    steps: &[(Step, Vec<String>)],
    ledger: &Ledger,
) -> MigrateResult<PathBuf> {
    let now = Utc::now().naive_utc();
    let target = destination(path, now);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, render(plan, steps, ledger, now))?;
    tracing::info!("wrote {} migration steps to {}", steps.len(), target.display());
    Ok(target)
}
