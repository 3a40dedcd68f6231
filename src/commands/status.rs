//! `status`

use colored::*;
use serde::Serialize;

use crate::config::Config;
use crate::error::MigrateResult;
use crate::migrate::drift;
use crate::migrate::set::MigrationSet;
use crate::source::Catalog;
use crate::store::MigrationStore;

/// State of one version as seen by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionState {
    Migrated,
    Pending,
    Orphaned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionStatus {
    pub version: String,
    pub name: Option<String>,
    pub state: VersionState,
    pub executed_at: Option<String>,
}

/// Snapshot printed by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub name: String,
    pub table: String,
    pub migrations_dir: String,
    pub current: String,
    pub latest: Option<String>,
    pub next: Option<String>,
    pub executed: usize,
    pub available: usize,
    pub pending: usize,
    pub orphaned: usize,
    pub versions: Vec<VersionStatus>,
}

/// Collect the status report.
pub async fn status<S: MigrationStore>(
    config: &Config,
    catalog: &Catalog,
    store: &mut S,
) -> MigrateResult<StatusReport> {
    let set = MigrationSet::new(catalog.versions().cloned(), store.executed().await?);
    let current = set.current();
    let orphans = drift::detect(&set);

    let mut versions: Vec<VersionStatus> = set
        .executed()
        .chain(set.available().filter(|v| !set.is_executed(v)))
        .map(|v| VersionStatus {
            version: v.to_string(),
            name: catalog.get(v).map(|s| s.name.clone()),
            state: if orphans.contains(v) {
                VersionState::Orphaned
            } else if set.is_executed(v) {
                VersionState::Migrated
            } else {
                VersionState::Pending
            },
            executed_at: set
                .record(v)
                .and_then(|r| r.executed_at)
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
        })
        .collect();
    versions.sort_by(|a, b| a.version.cmp(&b.version));

    let pending = versions
        .iter()
        .filter(|v| v.state == VersionState::Pending)
        .count();

    Ok(StatusReport {
        name: config.name.clone(),
        table: config.table.clone(),
        migrations_dir: config.migrations_dir.display().to_string(),
        current: current.to_string(),
        latest: set.latest().map(|v| v.to_string()),
        next: set.next_of(&current).map(|v| v.to_string()),
        executed: set.executed_count(),
        available: set.available_count(),
        pending,
        orphaned: orphans.len(),
        versions,
    })
}

/// Human readable status output.
pub fn print_status(report: &StatusReport, show_versions: bool) {
    println!("{}", "📋 Migration Status".cyan().bold());
    println!();
    println!("  {:<28} {}", "Name:", report.name.yellow());
    println!("  {:<28} {}", "Version table:", report.table.green());
    println!("  {:<28} {}", "Migrations directory:", report.migrations_dir);
    println!("  {:<28} {}", "Current version:", report.current.cyan());
    println!(
        "  {:<28} {}",
        "Next version:",
        report.next.as_deref().unwrap_or("Already at latest version")
    );
    println!(
        "  {:<28} {}",
        "Latest version:",
        report.latest.as_deref().unwrap_or("-")
    );
    println!("  {:<28} {}", "Executed migrations:", report.executed);
    println!("  {:<28} {}", "Available migrations:", report.available);
    println!("  {:<28} {}", "New migrations:", report.pending);

    let orphaned = report.orphaned.to_string();
    let orphaned = if report.orphaned > 0 {
        orphaned.red().bold()
    } else {
        orphaned.normal()
    };
    println!("  {:<28} {}", "Executed unavailable:", orphaned);

    if !show_versions {
        return;
    }

    println!();
    for v in &report.versions {
        let marker = match v.state {
            VersionState::Migrated => "✓".green(),
            VersionState::Pending => "○".dimmed(),
            VersionState::Orphaned => "✗".red(),
        };
        println!(
            "  {} {} {} {}",
            marker,
            v.version.yellow(),
            v.name.as_deref().unwrap_or("(not registered)"),
            v.executed_at.as_deref().unwrap_or("").dimmed()
        );
    }
}
