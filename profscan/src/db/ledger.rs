//! Ledger contract and its SQLite implementation

use super::retry::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};
use crate::models::{ProfileDetails, RatingField, ResolvedRecord, SkipReason, SkippedName};
use async_trait::async_trait;
use chrono::Utc;
use profscan_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Row counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub resolved: u64,
    pub skipped: u64,
    pub pending: u64,
}

/// Idempotent store of resolved records and skipped names
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Insert or replace by `record.id()`; the row becomes the newest write
    async fn upsert_resolved(&self, record: &ResolvedRecord) -> Result<()>;

    /// Insert or replace by name
    async fn upsert_skipped(&self, name: &str, reason: SkipReason) -> Result<()>;

    /// Lookup name of the most recently written resolved record
    async fn last_processed_name(&self) -> Result<Option<String>>;

    /// Most recently written record for a lookup name
    async fn load_resolved(&self, lookup_name: &str) -> Result<Option<ResolvedRecord>>;

    /// Skip set, ordered by name
    async fn list_skipped(&self) -> Result<Vec<SkippedName>>;

    /// Record a name whose attempt ended without a terminal outcome
    async fn mark_pending(&self, name: &str, last_error: &str) -> Result<()>;

    /// Drop a name from the pending set; no-op if absent
    async fn clear_pending(&self, name: &str) -> Result<()>;

    /// Pending names, ordered by name
    async fn list_pending(&self) -> Result<Vec<String>>;

    async fn summary(&self) -> Result<LedgerSummary>;
}

/// SQLite-backed ledger
#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Wrap a pool whose schema is already initialized
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the ledger at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = profscan_common::db::init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn write_resolved(&self, record: &ResolvedRecord) -> Result<()> {
        let details = &record.details;

        sqlx::query(
            r#"
            INSERT INTO resolved (
                id, lookup_name, displayed_name, profile_locator, department,
                quality, difficulty, total_ratings, would_take_again, tags,
                write_seq, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                (SELECT COALESCE(MAX(write_seq), 0) + 1 FROM resolved),
                ?
            )
            ON CONFLICT(id) DO UPDATE SET
                lookup_name = excluded.lookup_name,
                displayed_name = excluded.displayed_name,
                profile_locator = excluded.profile_locator,
                department = excluded.department,
                quality = excluded.quality,
                difficulty = excluded.difficulty,
                total_ratings = excluded.total_ratings,
                would_take_again = excluded.would_take_again,
                tags = excluded.tags,
                write_seq = excluded.write_seq,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.id())
        .bind(&record.lookup_name)
        .bind(&record.displayed_name)
        .bind(&details.profile_locator)
        .bind(RatingField::Department.to_stored(details.department.as_deref()))
        .bind(RatingField::Quality.to_stored(details.quality.as_deref()))
        .bind(RatingField::Difficulty.to_stored(details.difficulty.as_deref()))
        .bind(RatingField::TotalRatings.to_stored(details.total_ratings.as_deref()))
        .bind(RatingField::WouldTakeAgain.to_stored(details.would_take_again.as_deref()))
        .bind(details.tags_to_stored())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn write_skipped(&self, name: &str, reason: SkipReason) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO skipped (name, reason, skipped_at)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                reason = excluded.reason,
                skipped_at = excluded.skipped_at
            "#,
        )
        .bind(name)
        .bind(reason.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn write_pending(&self, name: &str, last_error: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pending (name, last_error, failed_at)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                last_error = excluded.last_error,
                failed_at = excluded.failed_at
            "#,
        )
        .bind(name)
        .bind(last_error)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_pending(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM pending WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn record_from_row(row: &SqliteRow) -> ResolvedRecord {
    let tags: String = row.get("tags");

    ResolvedRecord {
        lookup_name: row.get("lookup_name"),
        displayed_name: row.get("displayed_name"),
        details: ProfileDetails {
            id: row.get("id"),
            profile_locator: row.get("profile_locator"),
            department: RatingField::Department.from_stored(row.get("department")),
            quality: RatingField::Quality.from_stored(row.get("quality")),
            difficulty: RatingField::Difficulty.from_stored(row.get("difficulty")),
            total_ratings: RatingField::TotalRatings.from_stored(row.get("total_ratings")),
            would_take_again: RatingField::WouldTakeAgain.from_stored(row.get("would_take_again")),
            tags: ProfileDetails::tags_from_stored(&tags),
        },
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn upsert_resolved(&self, record: &ResolvedRecord) -> Result<()> {
        retry_on_lock("upsert resolved", DEFAULT_MAX_LOCK_WAIT_MS, || {
            self.write_resolved(record)
        })
        .await?;

        tracing::debug!(
            id = %record.id(),
            lookup_name = %record.lookup_name,
            "Committed resolved record"
        );
        Ok(())
    }

    async fn upsert_skipped(&self, name: &str, reason: SkipReason) -> Result<()> {
        retry_on_lock("upsert skipped", DEFAULT_MAX_LOCK_WAIT_MS, || {
            self.write_skipped(name, reason)
        })
        .await?;

        tracing::debug!(name = %name, reason = %reason, "Added to skipped list");
        Ok(())
    }

    async fn last_processed_name(&self) -> Result<Option<String>> {
        let name: Option<String> = sqlx::query_scalar(
            "SELECT lookup_name FROM resolved ORDER BY write_seq DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(name)
    }

    async fn load_resolved(&self, lookup_name: &str) -> Result<Option<ResolvedRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, lookup_name, displayed_name, profile_locator, department,
                   quality, difficulty, total_ratings, would_take_again, tags
            FROM resolved
            WHERE lookup_name = ?
            ORDER BY write_seq DESC
            LIMIT 1
            "#,
        )
        .bind(lookup_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn list_skipped(&self) -> Result<Vec<SkippedName>> {
        let rows = sqlx::query("SELECT name, reason FROM skipped ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let mut skipped = Vec::with_capacity(rows.len());
        for row in rows {
            let reason: String = row.get("reason");
            let reason = reason.parse::<SkipReason>().map_err(Error::Internal)?;
            skipped.push(SkippedName::new(row.get::<String, _>("name"), reason));
        }

        Ok(skipped)
    }

    async fn mark_pending(&self, name: &str, last_error: &str) -> Result<()> {
        retry_on_lock("mark pending", DEFAULT_MAX_LOCK_WAIT_MS, || {
            self.write_pending(name, last_error)
        })
        .await?;

        tracing::debug!(name = %name, "Marked pending for retry");
        Ok(())
    }

    async fn clear_pending(&self, name: &str) -> Result<()> {
        retry_on_lock("clear pending", DEFAULT_MAX_LOCK_WAIT_MS, || {
            self.delete_pending(name)
        })
        .await
    }

    async fn list_pending(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pending ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn summary(&self) -> Result<LedgerSummary> {
        let resolved: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resolved")
            .fetch_one(&self.pool)
            .await?;
        let skipped: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skipped")
            .fetch_one(&self.pool)
            .await?;
        let pending: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending")
            .fetch_one(&self.pool)
            .await?;

        Ok(LedgerSummary {
            resolved: resolved.max(0) as u64,
            skipped: skipped.max(0) as u64,
            pending: pending.max(0) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    async fn open_ledger() -> (TempDir, SqliteLedger) {
        let temp_dir = TempDir::new().unwrap();
        let ledger = SqliteLedger::open(&temp_dir.path().join("professors.db"))
            .await
            .unwrap();
        (temp_dir, ledger)
    }

    fn record(id: &str, lookup: &str, quality: Option<&str>) -> ResolvedRecord {
        ResolvedRecord::new(
            lookup,
            lookup,
            ProfileDetails {
                id: id.to_string(),
                profile_locator: format!("https://directory.test/professor/{}", id),
                quality: quality.map(str::to_string),
                tags: BTreeSet::from(["Caring".to_string()]),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_upsert_resolved_is_idempotent() {
        let (_dir, ledger) = open_ledger().await;

        ledger.upsert_resolved(&record("100", "Jane Doe", Some("3.1"))).await.unwrap();
        ledger.upsert_resolved(&record("100", "Jane Doe", Some("4.9"))).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resolved WHERE id = '100'")
            .fetch_one(ledger.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);

        let loaded = ledger.load_resolved("Jane Doe").await.unwrap().unwrap();
        assert_eq!(loaded.details.quality.as_deref(), Some("4.9"));
    }

    #[tokio::test]
    async fn test_sentinels_stored_and_restored() {
        let (_dir, ledger) = open_ledger().await;
        ledger.upsert_resolved(&record("7", "Sam Roe", None)).await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT quality FROM resolved WHERE id = '7'")
            .fetch_one(ledger.pool())
            .await
            .unwrap();
        assert_eq!(stored, "No quality rating found");

        let loaded = ledger.load_resolved("Sam Roe").await.unwrap().unwrap();
        assert_eq!(loaded, record("7", "Sam Roe", None));
    }

    #[tokio::test]
    async fn test_last_processed_follows_latest_write() {
        let (_dir, ledger) = open_ledger().await;
        assert_eq!(ledger.last_processed_name().await.unwrap(), None);

        ledger.upsert_resolved(&record("1", "First", None)).await.unwrap();
        ledger.upsert_resolved(&record("2", "Second", None)).await.unwrap();
        assert_eq!(ledger.last_processed_name().await.unwrap().as_deref(), Some("Second"));

        // Rewriting an older row makes it the newest again
        ledger.upsert_resolved(&record("1", "First", Some("5.0"))).await.unwrap();
        assert_eq!(ledger.last_processed_name().await.unwrap().as_deref(), Some("First"));
    }

    #[tokio::test]
    async fn test_skipped_last_write_wins() {
        let (_dir, ledger) = open_ledger().await;

        ledger.upsert_skipped("Zed Nobody", SkipReason::SearchTimeout).await.unwrap();
        ledger.upsert_skipped("Zed Nobody", SkipReason::NoSearchResults).await.unwrap();
        ledger.upsert_skipped("Adam Smith", SkipReason::AffiliationRejected).await.unwrap();

        let skipped = ledger.list_skipped().await.unwrap();
        assert_eq!(
            skipped,
            vec![
                SkippedName::new("Adam Smith", SkipReason::AffiliationRejected),
                SkippedName::new("Zed Nobody", SkipReason::NoSearchResults),
            ]
        );

        let summary = ledger.summary().await.unwrap();
        assert_eq!(
            summary,
            LedgerSummary {
                resolved: 0,
                skipped: 2,
                pending: 0
            }
        );
    }

    #[tokio::test]
    async fn test_pending_mark_and_clear() {
        let (_dir, ledger) = open_ledger().await;

        ledger.mark_pending("Kim Park", "connection reset").await.unwrap();
        ledger.mark_pending("Kim Park", "HTTP 503").await.unwrap();
        ledger.mark_pending("Bo Chen", "cancelled").await.unwrap();
        assert_eq!(ledger.list_pending().await.unwrap(), vec!["Bo Chen", "Kim Park"]);

        let last_error: String =
            sqlx::query_scalar("SELECT last_error FROM pending WHERE name = 'Kim Park'")
                .fetch_one(ledger.pool())
                .await
                .unwrap();
        assert_eq!(last_error, "HTTP 503");

        ledger.clear_pending("Kim Park").await.unwrap();
        ledger.clear_pending("Never Marked").await.unwrap();
        assert_eq!(ledger.list_pending().await.unwrap(), vec!["Bo Chen"]);
        assert_eq!(ledger.summary().await.unwrap().pending, 1);

        // Pending names never move the resume checkpoint
        assert_eq!(ledger.last_processed_name().await.unwrap(), None);
    }
}
