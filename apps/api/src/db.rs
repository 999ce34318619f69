use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use tracing::info;

/// Creates and returns a SQLite connection pool. The database file (and its
/// directory) is created on first use.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Connecting to SQLite at {database_url}...");

    if let Some(dir) = database_dir(database_url) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Cannot create database directory {}", dir.display()))?;
    }

    let options = SqliteConnectOptions::from_str(database_url)
        .context("DATABASE_URL is not a valid SQLite URL")?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Parent directory of a file-backed `sqlite://` URL.
fn database_dir(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    name          TEXT,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS prompts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Creates missing tables and upgrades databases from before prompts were
/// owned by users. Safe to run on every start.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(SCHEMA).await?;

    let has_user_id: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info('prompts') WHERE name = 'user_id')",
    )
    .fetch_one(pool)
    .await?;
    if !has_user_id {
        sqlx::query("ALTER TABLE prompts ADD COLUMN user_id INTEGER NULL REFERENCES users(id)")
            .execute(pool)
            .await?;
        info!("Added prompts.user_id column");
    }

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_prompts_user_created ON prompts(user_id, created_at)",
    )
    .execute(pool)
    .await?;

    info!("Database schema is up to date");
    Ok(())
}

/// Connectivity probe used by `check-db`.
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    anyhow::ensure!(one == 1, "unexpected probe result {one}");
    Ok(())
}

/// Fresh in-memory database with the schema applied.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}
