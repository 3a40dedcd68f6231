use std::fs;

use pretty_assertions::assert_eq;
use qail_migrate::commands::{self, MigrateOptions, VersionState};
use qail_migrate::prelude::*;

fn write_migrations(dir: &std::path::Path) {
    fs::write(
        dir.join("20240101000000_users.up.sql"),
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);",
    )
    .unwrap();
    fs::write(dir.join("20240101000000_users.down.sql"), "DROP TABLE users;").unwrap();
    fs::write(
        dir.join("20240102000000_posts.up.sql"),
        "-- posts\nCREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT);\nINSERT INTO posts (title) VALUES ('a;b');",
    )
    .unwrap();
    fs::write(dir.join("20240102000000_posts.down.sql"), "DROP TABLE posts;").unwrap();
}

#[tokio::test]
async fn migrate_up_then_back_to_zero() {
    let work = tempfile::tempdir().unwrap();
    let migrations = work.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    write_migrations(&migrations);

    let config = Config {
        migrations_dir: migrations.clone(),
        ..Config::default()
    };
    let url = format!("sqlite://{}?mode=rwc", work.path().join("app.db").display());
    let catalog = Catalog::load(&config.migrations_dir).unwrap();
    let mut store = SqlStore::connect(&url, config.ledger().unwrap()).await.unwrap();
    let mut gate = FixedGate(Answer::Yes);

    let up = commands::migrate(&config, &catalog, &mut store, &MigrateOptions::default(), &mut gate)
        .await
        .unwrap();
    assert_eq!(up.steps.len(), 2);
    assert_eq!(up.query_count(), 3);

    let report = commands::status(&config, &catalog, &mut store).await.unwrap();
    assert_eq!(report.current, "20240102000000");
    assert_eq!(report.pending, 0);
    assert!(report.versions.iter().all(|s| s.state == VersionState::Migrated));

    let down = MigrateOptions {
        version: "first".to_string(),
        ..MigrateOptions::default()
    };
    commands::migrate(&config, &catalog, &mut store, &down, &mut gate)
        .await
        .unwrap();
    let executed = store.executed().await.unwrap();
    let versions: Vec<_> = executed.iter().map(|r| r.version.to_string()).collect();
    assert_eq!(versions, vec!["20240101000000".to_string()]);

    let zero = MigrateOptions {
        version: "0".to_string(),
        ..MigrateOptions::default()
    };
    commands::migrate(&config, &catalog, &mut store, &zero, &mut gate)
        .await
        .unwrap();
    assert!(store.executed().await.unwrap().is_empty());
}

#[tokio::test]
async fn dry_run_and_write_sql_leave_a_fresh_database_empty() {
    let work = tempfile::tempdir().unwrap();
    let migrations = work.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    write_migrations(&migrations);

    let config = Config {
        migrations_dir: migrations.clone(),
        ..Config::default()
    };
    let url = format!("sqlite://{}?mode=rwc", work.path().join("fresh.db").display());
    let catalog = Catalog::load(&config.migrations_dir).unwrap();
    let mut store = SqlStore::connect(&url, config.ledger().unwrap()).await.unwrap();
    let mut gate = FixedGate(Answer::Yes);

    let dry_run = MigrateOptions {
        dry_run: true,
        ..MigrateOptions::default()
    };
    let summary = commands::migrate(&config, &catalog, &mut store, &dry_run, &mut gate)
        .await
        .unwrap();
    assert_eq!(summary.steps.len(), 2);

    let write_sql = MigrateOptions {
        write_sql: Some(work.path().join("out.sql")),
        ..MigrateOptions::default()
    };
    commands::migrate(&config, &catalog, &mut store, &write_sql, &mut gate)
        .await
        .unwrap();

    let tables = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
        .fetch_all(store.pool())
        .await
        .unwrap();
    assert!(tables.is_empty());
    assert!(store.executed().await.unwrap().is_empty());
}
