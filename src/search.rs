//! Read-only queries over the `jira` table.
//!
//! Readers issue one trigram `MATCH` across all columns. A query that fails
//! to parse is indistinguishable from one with no hits: both produce an
//! empty list.
//!
//! The query keeps its `ORDER BY DATETIME(updated) DESC` clause, but stored
//! timestamps use the quoted Jira encoding, which `DATETIME()` does not
//! parse. The sort key is NULL for every row, so result order is whatever
//! the full-text scan yields.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::debug;

use crate::config::Config;
use crate::db;
use crate::models::IssueRecord;

const MATCH_QUERY: &str = "SELECT * FROM jira WHERE jira MATCH ? ORDER BY DATETIME(updated) DESC";

pub async fn search_issues(pool: &SqlitePool, query: &str) -> Vec<IssueRecord> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    match sqlx::query_as::<_, IssueRecord>(MATCH_QUERY)
        .bind(query)
        .fetch_all(pool)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            debug!(query, error = %e, "search query failed");
            Vec::new()
        }
    }
}

pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let mut results = search_issues(&pool, query).await;
    pool.close().await;

    if let Some(lim) = limit {
        results.truncate(lim);
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for issue in &results {
        println!("{:<12} {:<14} {}", issue.key, issue.status, issue.summary);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, UpdatedOnRewrite};
    use crate::jira::JiraTime;
    use crate::migrate;
    use crate::writer::IndexWriter;
    use std::path::PathBuf;
    use tempfile::TempDir;

    async fn seeded() -> (TempDir, SqlitePool) {
        let tmp = TempDir::new().unwrap();
        let config = Config::minimal(PathBuf::from(tmp.path().join("jira.db")));
        let pool = db::connect(&config).await.unwrap();
        migrate::ensure_schema(&pool).await.unwrap();

        let mut writer = IndexWriter::new(pool.clone(), UpdatedOnRewrite::Updated);
        let rows = [
            ("TI-1", "Bootloader crash", "2021-01-01T00:00:00.000+0000"),
            ("TI-2", "Wheel encoder drift", "2021-03-01T00:00:00.000+0000"),
            ("TI-3", "Crash in planner", "2021-02-01T00:00:00.000+0000"),
        ];
        for (key, summary, updated) in rows {
            let record = IssueRecord {
                key: key.to_string(),
                summary: summary.to_string(),
                updated: JiraTime::parse(updated).unwrap().encode(),
                ..Default::default()
            };
            writer.upsert(&record).await.unwrap();
        }
        (tmp, pool)
    }

    #[tokio::test]
    async fn test_substring_match() {
        let (_tmp, pool) = seeded().await;
        let hits = search_issues(&pool, "rash").await;
        let mut keys: Vec<&str> = hits.iter().map(|r| r.key.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["TI-1", "TI-3"]);
    }

    #[tokio::test]
    async fn test_stored_timestamps_have_no_datetime_sort_key() {
        let (_tmp, pool) = seeded().await;
        let keys: Vec<Option<String>> = sqlx::query_scalar("SELECT DATETIME(updated) FROM jira")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(Option::is_none));
    }

    #[tokio::test]
    async fn test_matches_any_column() {
        let (_tmp, pool) = seeded().await;
        let hits = search_issues(&pool, "\"TI-2\"").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].summary, "Wheel encoder drift");
    }

    #[tokio::test]
    async fn test_empty_and_invalid_queries_yield_nothing() {
        let (_tmp, pool) = seeded().await;
        assert!(search_issues(&pool, "   ").await.is_empty());
        assert!(search_issues(&pool, "\"unterminated").await.is_empty());
        assert!(search_issues(&pool, "zzzzzz").await.is_empty());
    }
}
