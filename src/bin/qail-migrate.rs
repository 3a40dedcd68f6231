use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use qail_migrate::commands::{self, MigrateOptions};
use qail_migrate::migrate::ShellGate;
use qail_migrate::source::Catalog;
use qail_migrate::store::SqlStore;
use qail_migrate::{Config, MigrateError};

#[derive(Parser)]
#[command(name = "qail-migrate")]
#[command(version, about = "Resolve, plan and run schema migrations")]
struct Cli {
    /// Configuration file (defaults to ./qail-migrate.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database connection URL
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Never ask for confirmation
    #[arg(short = 'n', long, global = true)]
    no_interaction: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate to a version or alias (latest, first, prev, next, current, current-N, current+N)
    Migrate {
        /// Target version or alias
        #[arg(default_value = "latest")]
        version: String,

        /// Write the SQL to a file instead of executing it
        #[arg(long, num_args = 0..=1, require_equals = true, value_name = "PATH")]
        write_sql: Option<Option<PathBuf>>,

        /// Walk the plan without touching the database
        #[arg(long)]
        dry_run: bool,

        /// Time each migration and query
        #[arg(long)]
        query_time: bool,

        /// Succeed when there is nothing to migrate
        #[arg(long)]
        allow_no_migration: bool,
    },

    /// Show the migration status
    Status {
        /// List every version with its state
        #[arg(long)]
        show_versions: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QAIL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            let code = err
                .downcast_ref::<MigrateError>()
                .map(MigrateError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?.with_database_url(cli.database_url);
    let catalog = Catalog::load(&config.migrations_dir)?;
    tracing::debug!(
        dir = %config.migrations_dir.display(),
        migrations = catalog.len(),
        "loaded migrations"
    );

    let mut store = SqlStore::connect(config.database_url()?, config.ledger()?).await?;

    match cli.command {
        Commands::Migrate {
            version,
            write_sql,
            dry_run,
            query_time,
            allow_no_migration,
        } => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            let options = MigrateOptions {
                version,
                write_sql: commands::write_sql_destination(write_sql, &cwd),
                dry_run,
                query_time,
                allow_no_migration,
            };
            let interactive = !cli.no_interaction && std::io::stdin().is_terminal();
            let mut gate = ShellGate::new(interactive);
            commands::migrate(&config, &catalog, &mut store, &options, &mut gate).await?;
        }
        Commands::Status {
            show_versions,
            json,
        } => {
            let report = commands::status(&config, &catalog, &mut store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                commands::print_status(&report, show_versions);
            }
        }
    }

    Ok(())
}
