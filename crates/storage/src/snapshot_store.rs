//! SQLite-backed snapshot store.
//!
//! Two tables (see `migrations/`):
//! - `bounce_snapshots` holds at most one row, the current snapshot.
//! - `fetch_log` is append-only and never pruned.
//!
//! [`SnapshotStore::replace`] runs DELETE + INSERT inside one transaction, so
//! readers see either the previous snapshot or the new one, never a mix.
//! [`SnapshotStore::commit_run`] adds the run's fetch-log entry to that same
//! transaction.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info};

use bounce_core::{BounceRecord, FetchOutcome, OutcomeStatus, Snapshot};

use crate::error::StorageError;

/// What `current()` found in the snapshot slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotView {
    /// No run has completed successfully yet.
    Empty,
    Ready(Snapshot),
}

/// Handle to the bounce database. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
}

impl SnapshotStore {
    /// Open (creating if missing) the database file at `path` and apply migrations.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path = %path.display(), "snapshot store opened");
        Ok(store)
    }

    /// Private in-memory database, used by tests and one-off runs.
    ///
    /// Pinned to a single connection that never idles out, since every new
    /// SQLite memory connection would start with an empty database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Discard the previous snapshot and install `snapshot` as the current one.
    pub async fn replace(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let data = serde_json::to_string(&snapshot.records)?;

        let mut tx = self.pool.begin().await?;
        write_snapshot(&mut tx, snapshot, &data).await?;
        tx.commit().await?;

        debug!(
            records = snapshot.records_count(),
            campaigns = snapshot.campaigns_count,
            "snapshot replaced"
        );
        Ok(())
    }

    /// Install `snapshot` and append `outcome` in one transaction.
    ///
    /// If either write fails nothing is committed: the previous snapshot stays
    /// current and the fetch log gains no entry.
    pub async fn commit_run(&self, snapshot: &Snapshot, outcome: &FetchOutcome) -> Result<(), StorageError> {
        let data = serde_json::to_string(&snapshot.records)?;

        let mut tx = self.pool.begin().await?;
        write_snapshot(&mut tx, snapshot, &data).await?;
        insert_outcome(&mut *tx, outcome).await?;
        tx.commit().await?;

        debug!(
            records = snapshot.records_count(),
            campaigns = snapshot.campaigns_count,
            result = outcome.result.as_str(),
            "run committed"
        );
        Ok(())
    }

    /// The latest snapshot, or [`SnapshotView::Empty`] before the first successful run.
    pub async fn current(&self) -> Result<SnapshotView, StorageError> {
        let row = sqlx::query(
            "SELECT data, campaigns_count, created_at
             FROM bounce_snapshots
             ORDER BY id DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(SnapshotView::Empty);
        };

        let data: String = row.try_get("data")?;
        let campaigns_count: i64 = row.try_get("campaigns_count")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        let records: Vec<BounceRecord> = serde_json::from_str(&data)
            .map_err(|e| StorageError::Corrupt(format!("snapshot data: {}", e)))?;

        Ok(SnapshotView::Ready(Snapshot {
            records,
            campaigns_count: usize::try_from(campaigns_count).unwrap_or(0),
            created_at,
        }))
    }

    /// Append one entry to the fetch log.
    pub async fn append_outcome(&self, outcome: &FetchOutcome) -> Result<(), StorageError> {
        insert_outcome(&self.pool, outcome).await
    }

    /// Up to `limit` fetch-log entries, newest first.
    pub async fn recent_outcomes(&self, limit: u32) -> Result<Vec<FetchOutcome>, StorageError> {
        let rows = sqlx::query(
            "SELECT status, message, fetched_at
             FROM fetch_log
             ORDER BY id DESC
             LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<FetchOutcome, StorageError> {
                let status: String = row.try_get("status")?;
                let message: Option<String> = row.try_get("message")?;
                let fetched_at: DateTime<Utc> = row.try_get("fetched_at")?;
                Ok(FetchOutcome {
                    result: OutcomeStatus::from_str(&status).map_err(StorageError::Corrupt)?,
                    detail: message.unwrap_or_default(),
                    occurred_at: fetched_at,
                })
            })
            .collect()
    }

    /// Close the pool, waiting for in-flight statements to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn write_snapshot(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &Snapshot,
    data: &str,
) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM bounce_snapshots")
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "INSERT INTO bounce_snapshots (data, campaigns_count, records_count, created_at)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(data)
    .bind(snapshot.campaigns_count as i64)
    .bind(snapshot.records_count() as i64)
    .bind(snapshot.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_outcome<'e, E>(executor: E, outcome: &FetchOutcome) -> Result<(), StorageError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO fetch_log (status, message, fetched_at) VALUES (?1, ?2, ?3)")
        .bind(outcome.result.as_str())
        .bind(&outcome.detail)
        .bind(outcome.occurred_at)
        .execute(executor)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounce_core::{CampaignId, EmailStatus};

    fn record(email: &str, campaign: i64) -> BounceRecord {
        BounceRecord {
            recipient_address: Some(email.to_string()),
            sender_address: Some("sender@example.org".to_string()),
            message_body: Some("<p>hi</p>".to_string()),
            subject: Some("Intro".to_string()),
            campaign_id: CampaignId::Number(campaign),
            campaign_name: format!("Campaign {}", campaign),
            status: EmailStatus::Bounced,
            sent_at: "2025-06-01T10:00:00Z".to_string(),
            sequence_number: Some(1),
            is_bounced: true,
        }
    }

    async fn snapshot_rows(store: &SnapshotStore) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM bounce_snapshots")
            .fetch_one(&store.pool)
            .await
            .unwrap()
    }

    fn unwrap_ready(view: SnapshotView) -> Snapshot {
        match view {
            SnapshotView::Ready(s) => s,
            SnapshotView::Empty => panic!("expected a stored snapshot"),
        }
    }

    #[tokio::test]
    async fn current_is_empty_before_first_replace() {
        let store = SnapshotStore::in_memory().await.unwrap();
        assert_eq!(store.current().await.unwrap(), SnapshotView::Empty);
    }

    #[tokio::test]
    async fn replace_installs_snapshot() {
        let store = SnapshotStore::in_memory().await.unwrap();
        let snapshot = Snapshot::new(vec![record("a@example.com", 1), record("b@example.com", 2)], 2);

        store.replace(&snapshot).await.unwrap();

        let stored = unwrap_ready(store.current().await.unwrap());
        assert_eq!(stored.records, snapshot.records);
        assert_eq!(stored.campaigns_count, 2);
        assert_eq!(stored.created_at.timestamp(), snapshot.created_at.timestamp());
    }

    #[tokio::test]
    async fn replace_twice_with_same_input_keeps_one_copy() {
        let store = SnapshotStore::in_memory().await.unwrap();
        let snapshot = Snapshot::new(vec![record("a@example.com", 1)], 1);

        store.replace(&snapshot).await.unwrap();
        store.replace(&snapshot).await.unwrap();

        let stored = unwrap_ready(store.current().await.unwrap());
        assert_eq!(stored.records.len(), 1);
        assert_eq!(stored.records, snapshot.records);
        assert_eq!(snapshot_rows(&store).await, 1);
    }

    #[tokio::test]
    async fn replace_discards_previous_snapshot() {
        let store = SnapshotStore::in_memory().await.unwrap();
        store
            .replace(&Snapshot::new(vec![record("old@example.com", 1)], 1))
            .await
            .unwrap();
        store.replace(&Snapshot::new(Vec::new(), 0)).await.unwrap();

        let stored = unwrap_ready(store.current().await.unwrap());
        assert!(stored.records.is_empty());
        assert_eq!(stored.campaigns_count, 0);
        assert_eq!(snapshot_rows(&store).await, 1);
    }

    #[tokio::test]
    async fn recent_outcomes_newest_first_and_bounded() {
        let store = SnapshotStore::in_memory().await.unwrap();
        for i in 0..5 {
            store
                .append_outcome(&FetchOutcome::success(format!("run {}", i)))
                .await
                .unwrap();
        }
        store.append_outcome(&FetchOutcome::error("upstream down")).await.unwrap();

        let recent = store.recent_outcomes(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].result, OutcomeStatus::Error);
        assert_eq!(recent[0].detail, "upstream down");
        assert_eq!(recent[1].detail, "run 4");
        assert_eq!(recent[2].detail, "run 3");

        let all = store.recent_outcomes(100).await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn outcomes_survive_snapshot_replacement() {
        let store = SnapshotStore::in_memory().await.unwrap();
        store.append_outcome(&FetchOutcome::success("first")).await.unwrap();
        store.replace(&Snapshot::new(Vec::new(), 0)).await.unwrap();
        store.append_outcome(&FetchOutcome::success("second")).await.unwrap();
        store.replace(&Snapshot::new(Vec::new(), 0)).await.unwrap();

        assert_eq!(store.recent_outcomes(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn corrupt_snapshot_data_is_reported() {
        let store = SnapshotStore::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO bounce_snapshots (data, campaigns_count, records_count, created_at)
             VALUES ('not json', 0, 0, ?1)",
        )
        .bind(Utc::now())
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.current().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn commit_run_installs_snapshot_and_logs_outcome() {
        let store = SnapshotStore::in_memory().await.unwrap();

        store
            .commit_run(
                &Snapshot::new(vec![record("x@example.com", 1)], 1),
                &FetchOutcome::success("fetched 1"),
            )
            .await
            .unwrap();

        let stored = unwrap_ready(store.current().await.unwrap());
        assert_eq!(stored.records_count(), 1);
        let outcomes = store.recent_outcomes(10).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].detail, "fetched 1");
    }

    #[tokio::test]
    async fn commit_run_keeps_previous_snapshot_when_outcome_insert_fails() {
        let store = SnapshotStore::in_memory().await.unwrap();
        store.replace(&Snapshot::new(Vec::new(), 0)).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_success BEFORE INSERT ON fetch_log
             WHEN NEW.status = 'success'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store
            .commit_run(
                &Snapshot::new(vec![record("new@example.com", 2)], 1),
                &FetchOutcome::success("fetched 1"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Database(_)), "got {err:?}");
        let stored = unwrap_ready(store.current().await.unwrap());
        assert_eq!(stored.records_count(), 0);
        assert_eq!(stored.campaigns_count, 0);
        assert_eq!(snapshot_rows(&store).await, 1);
        assert!(store.recent_outcomes(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bounces.db");

        {
            let store = SnapshotStore::open(&path).await.unwrap();
            store
                .replace(&Snapshot::new(vec![record("keep@example.com", 9)], 1))
                .await
                .unwrap();
            store.append_outcome(&FetchOutcome::success("stored")).await.unwrap();
            store.close().await;
        }

        let store = SnapshotStore::open(&path).await.unwrap();
        let stored = unwrap_ready(store.current().await.unwrap());
        assert_eq!(stored.records[0].recipient_address.as_deref(), Some("keep@example.com"));
        assert_eq!(store.recent_outcomes(10).await.unwrap()[0].detail, "stored");
        store.close().await;
    }
}
