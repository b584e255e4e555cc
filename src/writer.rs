//! Keyed upserts into the `jira` table.
//!
//! FTS5 tables cannot declare a UNIQUE constraint, so an upsert is a point
//! lookup by `key` followed by either a full-row `INSERT` or a full-row
//! `UPDATE`. Both statements run in one transaction per record. The writer
//! also takes `&mut self`: one [`IndexWriter`] per store, driven by one
//! sync loop, is what keeps `key` unique.

use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::config::UpdatedOnRewrite;
use crate::error::{Result, SyncError};
use crate::models::IssueRecord;

const SELECT_KEY: &str = "SELECT key FROM jira WHERE key = ?";

const INSERT_ROW: &str =
    "INSERT INTO jira VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_ROW: &str = r#"
UPDATE jira SET
    key = ?, summary = ?, description = ?,
    creatorEmail = ?, creatorName = ?,
    assigneeEmail = ?, assigneeName = ?,
    comments = ?, created = ?, updated = ?,
    fixVersion = ?, issueType = ?, priority = ?, status = ?
WHERE key = ?
"#;

/// Which write path a record took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
}

/// Per-batch counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct IndexWriter {
    pool: SqlitePool,
    updated_on_rewrite: UpdatedOnRewrite,
}

impl IndexWriter {
    pub fn new(pool: SqlitePool, updated_on_rewrite: UpdatedOnRewrite) -> Self {
        Self {
            pool,
            updated_on_rewrite,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert `record`, or overwrite every column of the row with its key.
    pub async fn upsert(&mut self, record: &IssueRecord) -> Result<WriteOutcome> {
        let write_err = |source| SyncError::Write {
            key: record.key.clone(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(write_err)?;

        let existing: Option<String> = sqlx::query_scalar(SELECT_KEY)
            .bind(&record.key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(write_err)?;

        let outcome = if existing.is_none() {
            sqlx::query(INSERT_ROW)
                .bind(&record.key)
                .bind(&record.summary)
                .bind(&record.description)
                .bind(&record.creator_email)
                .bind(&record.creator_name)
                .bind(&record.assignee_email)
                .bind(&record.assignee_name)
                .bind(&record.comments)
                .bind(&record.created)
                .bind(&record.updated)
                .bind(&record.fix_version)
                .bind(&record.issue_type)
                .bind(&record.priority)
                .bind(&record.status)
                .execute(&mut *tx)
                .await
                .map_err(write_err)?;
            WriteOutcome::Inserted
        } else {
            let updated = match self.updated_on_rewrite {
                UpdatedOnRewrite::Created => &record.created,
                UpdatedOnRewrite::Updated => &record.updated,
            };
            sqlx::query(UPDATE_ROW)
                .bind(&record.key)
                .bind(&record.summary)
                .bind(&record.description)
                .bind(&record.creator_email)
                .bind(&record.creator_name)
                .bind(&record.assignee_email)
                .bind(&record.assignee_name)
                .bind(&record.comments)
                .bind(&record.created)
                .bind(updated)
                .bind(&record.fix_version)
                .bind(&record.issue_type)
                .bind(&record.priority)
                .bind(&record.status)
                .bind(&record.key)
                .execute(&mut *tx)
                .await
                .map_err(write_err)?;
            WriteOutcome::Updated
        };

        tx.commit().await.map_err(write_err)?;
        Ok(outcome)
    }

    /// Upsert every record; a failed record is logged and skipped.
    pub async fn write_all(&mut self, records: &[IssueRecord]) -> WriteSummary {
        let mut summary = WriteSummary::default();

        for record in records {
            match self.upsert(record).await {
                Ok(WriteOutcome::Inserted) => summary.inserted += 1,
                Ok(WriteOutcome::Updated) => summary.updated += 1,
                Err(e) => {
                    error!(key = %record.key, error = %e, "unable to write issue");
                    summary.failed += 1;
                }
            }
        }

        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            failed = summary.failed,
            "batch written"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::get::fetch_issue;
    use crate::{db, migrate};
    use std::path::PathBuf;
    use tempfile::TempDir;

    async fn setup(policy: UpdatedOnRewrite) -> (TempDir, IndexWriter) {
        let tmp = TempDir::new().unwrap();
        let config = Config::minimal(PathBuf::from(tmp.path().join("jira.db")));
        let pool = db::connect(&config).await.unwrap();
        migrate::ensure_schema(&pool).await.unwrap();
        (tmp, IndexWriter::new(pool, policy))
    }

    fn record(key: &str, summary: &str) -> IssueRecord {
        IssueRecord {
            key: key.to_string(),
            summary: summary.to_string(),
            created: "\"2021-01-01T00:00:00+0000\"".to_string(),
            updated: "\"2021-06-01T00:00:00+0000\"".to_string(),
            status: "Open".to_string(),
            ..Default::default()
        }
    }

    async fn row_count(writer: &IndexWriter) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM jira")
            .fetch_one(writer.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_update() {
        let (_tmp, mut writer) = setup(UpdatedOnRewrite::Updated).await;

        let first = record("TI-1", "Crash");
        assert_eq!(writer.upsert(&first).await.unwrap(), WriteOutcome::Inserted);

        let mut second = first.clone();
        second.summary = "Crash on boot".to_string();
        second.status = "Done".to_string();
        assert_eq!(writer.upsert(&second).await.unwrap(), WriteOutcome::Updated);

        assert_eq!(row_count(&writer).await, 1);
        let stored = fetch_issue(writer.pool(), "TI-1").await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_same_batch_twice_is_idempotent() {
        let (_tmp, mut writer) = setup(UpdatedOnRewrite::Updated).await;
        let batch = vec![record("TI-1", "a"), record("TI-2", "b")];

        let first = writer.write_all(&batch).await;
        assert_eq!(first.inserted, 2);
        let after_first = fetch_issue(writer.pool(), "TI-2").await.unwrap();

        let second = writer.write_all(&batch).await;
        assert_eq!(second.updated, 2);
        assert_eq!(second.failed, 0);
        assert_eq!(row_count(&writer).await, 2);
        assert_eq!(fetch_issue(writer.pool(), "TI-2").await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn test_rewrite_copies_created_into_updated_by_default() {
        let (_tmp, mut writer) = setup(UpdatedOnRewrite::Created).await;
        let r = record("TI-1", "a");

        writer.upsert(&r).await.unwrap();
        let inserted = fetch_issue(writer.pool(), "TI-1").await.unwrap().unwrap();
        assert_eq!(inserted.updated, r.updated);

        writer.upsert(&r).await.unwrap();
        let rewritten = fetch_issue(writer.pool(), "TI-1").await.unwrap().unwrap();
        assert_eq!(rewritten.created, r.created);
        assert_eq!(rewritten.updated, r.created);
    }

    #[tokio::test]
    async fn test_rewrite_keeps_real_updated_when_configured() {
        let (_tmp, mut writer) = setup(UpdatedOnRewrite::Updated).await;
        let r = record("TI-1", "a");

        writer.upsert(&r).await.unwrap();
        writer.upsert(&r).await.unwrap();
        let rewritten = fetch_issue(writer.pool(), "TI-1").await.unwrap().unwrap();
        assert_eq!(rewritten.updated, r.updated);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let (_tmp, mut writer) = setup(UpdatedOnRewrite::Created).await;
        sqlx::query("DROP TABLE jira")
            .execute(writer.pool())
            .await
            .unwrap();

        let summary = writer
            .write_all(&[record("TI-1", "a"), record("TI-2", "b")])
            .await;
        assert_eq!(
            summary,
            WriteSummary {
                inserted: 0,
                updated: 0,
                failed: 2
            }
        );
    }
}
