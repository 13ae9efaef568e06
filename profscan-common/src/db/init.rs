//! Database initialization
//!
//! Opens (creating if needed) the SQLite store holding the `resolved`,
//! `skipped` and `pending` tables. WAL journaling lets readers proceed while workers write.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every connection
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL allows concurrent readers with one writer; both settings are
    // applied per connection so every pooled connection carries them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Idempotent - safe to call on every start
    create_resolved_table(&pool).await?;
    create_skipped_table(&pool).await?;
    create_pending_table(&pool).await?;

    Ok(pool)
}

/// Create the resolved table
///
/// One row per resolved directory profile, keyed by the profile identifier.
/// `write_seq` orders rows by most recent write and backs the resume checkpoint.
pub async fn create_resolved_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resolved (
            id TEXT PRIMARY KEY,
            lookup_name TEXT NOT NULL,
            displayed_name TEXT NOT NULL,
            profile_locator TEXT NOT NULL,
            department TEXT NOT NULL,
            quality TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            total_ratings TEXT NOT NULL,
            would_take_again TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '',
            write_seq INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_resolved_write_seq ON resolved(write_seq)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the skipped table
///
/// Names with no acceptable match; last write wins.
pub async fn create_skipped_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS skipped (
            name TEXT PRIMARY KEY,
            reason TEXT NOT NULL,
            skipped_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the pending table
///
/// Names whose last attempt ended without a terminal outcome (transport
/// failure or cancellation). Retried ahead of the resume slice.
pub async fn create_pending_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pending (
            name TEXT PRIMARY KEY,
            last_error TEXT NOT NULL,
            failed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
