//! Store schema for the `jira` full-text table.
//!
//! The table is an FTS5 virtual table with the trigram tokenizer, so one
//! `MATCH` expression searches every column by substring. Column order is
//! part of the on-disk contract: external readers and the positional
//! `INSERT` in [`crate::writer`] both depend on it.

use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::error::{Result, SyncError};

/// Name of the full-text table.
pub const TABLE: &str = "jira";

/// Column names in positional order.
pub const COLUMNS: [&str; 14] = [
    "key",
    "summary",
    "description",
    "creatorEmail",
    "creatorName",
    "assigneeEmail",
    "assigneeName",
    "comments",
    "created",
    "updated",
    "fixVersion",
    "issueType",
    "priority",
    "status",
];

const SCHEMA: &str = r#"
CREATE VIRTUAL TABLE jira USING fts5(
    key, summary, description,
    creatorEmail, creatorName,
    assigneeEmail, assigneeName,
    comments, created, updated,
    fixVersion, issueType, priority, status,
    tokenize="trigram")
"#;

/// Result of [`ensure_schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Created,
    AlreadyExists,
}

/// Create the `jira` table unless it is already present.
///
/// Presence is checked in `sqlite_master` first. An existing table is the
/// steady state and is only logged; any failure to create a missing table is
/// returned as [`SyncError::Schema`].
pub async fn ensure_schema(pool: &SqlitePool) -> Result<SchemaStatus> {
    let exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?",
    )
    .bind(TABLE)
    .fetch_one(pool)
    .await
    .map_err(SyncError::Schema)?;

    if exists {
        info!("schema already exists");
        return Ok(SchemaStatus::AlreadyExists);
    }

    sqlx::query(SCHEMA)
        .execute(pool)
        .await
        .map_err(SyncError::Schema)?;

    info!("schema created");
    Ok(SchemaStatus::Created)
}

/// Open the configured store and make sure the schema exists.
pub async fn run_migrations(config: &Config) -> Result<SchemaStatus> {
    let pool = db::connect(config).await?;
    let status = ensure_schema(&pool).await;
    pool.close().await;
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn temp_config(tmp: &TempDir) -> Config {
        Config::minimal(PathBuf::from(tmp.path().join("jira.db")))
    }

    #[tokio::test]
    async fn test_schema_created_then_tolerated() {
        let tmp = TempDir::new().unwrap();
        let config = temp_config(&tmp);

        assert_eq!(
            run_migrations(&config).await.unwrap(),
            SchemaStatus::Created
        );
        assert_eq!(
            run_migrations(&config).await.unwrap(),
            SchemaStatus::AlreadyExists
        );
    }

    #[tokio::test]
    async fn test_column_order_matches_constant() {
        let tmp = TempDir::new().unwrap();
        let config = temp_config(&tmp);
        let pool = db::connect(&config).await.unwrap();
        ensure_schema(&pool).await.unwrap();

        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('jira')")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(names, COLUMNS);
        pool.close().await;
    }
}
