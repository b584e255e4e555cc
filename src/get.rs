//! Issue retrieval by key.

use anyhow::{bail, Result};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::models::IssueRecord;

pub async fn fetch_issue(
    pool: &SqlitePool,
    key: &str,
) -> std::result::Result<Option<IssueRecord>, sqlx::Error> {
    sqlx::query_as::<_, IssueRecord>("SELECT * FROM jira WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
}

/// Link to the issue in the Jira web UI.
pub fn browse_url(base_url: &str, key: &str) -> String {
    format!("{}/browse/{}", base_url.trim_end_matches('/'), key)
}

/// Core get function returning the stored record.
pub async fn get_issue(config: &Config, key: &str) -> Result<IssueRecord> {
    let pool = db::connect(config).await?;
    let found = fetch_issue(&pool, key).await;
    pool.close().await;

    match found? {
        Some(record) => Ok(record),
        None => bail!("issue not found: {}", key),
    }
}

/// CLI entry point: calls get_issue and prints to stdout.
pub async fn run_get(config: &Config, key: &str) -> Result<()> {
    let issue = get_issue(config, key).await?;

    println!("--- {} ---", issue.key);
    println!("summary:  {}", issue.summary);
    println!("type:     {}", issue.issue_type);
    println!("status:   {}", issue.status);
    println!("creator:  {} <{}>", issue.creator_name, issue.creator_email);
    if !issue.assignee_name.is_empty() {
        println!("assignee: {} <{}>", issue.assignee_name, issue.assignee_email);
    }
    println!("created:  {}", issue.created);
    println!("updated:  {}", issue.updated);
    println!("url:      {}", browse_url(&config.jira.base_url, &issue.key));
    println!();
    print!("{}", issue.render());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_url() {
        assert_eq!(
            browse_url("https://example.atlassian.net", "TI-7"),
            "https://example.atlassian.net/browse/TI-7"
        );
        assert_eq!(
            browse_url("https://example.atlassian.net/", "TI-7"),
            "https://example.atlassian.net/browse/TI-7"
        );
    }
}
