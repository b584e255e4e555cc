//! Paginated retrieval of issues updated after the watermark.
//!
//! The remote side is abstracted behind [`IssueSearch`] so the pagination
//! logic can be driven by [`crate::jira::JiraClient`] in production and by an
//! in-memory fake in tests.
//!
//! # Pagination
//!
//! Pages are requested with a fixed `maxResults` starting at offset 0. The
//! `total` reported by the first page bounds the loop; each following request
//! starts at `page.start_at + page.issues.len()`. Any page error aborts the
//! whole fetch, so a cycle either sees the complete window or nothing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;
use tracing::debug;

use crate::error::SyncError;
use crate::jira::RemoteIssue;

/// Offset window for one search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start_at: usize,
    pub max_results: usize,
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub issues: Vec<RemoteIssue>,
    /// Total number of matching issues across all pages.
    pub total: usize,
    /// Offset the server actually used for this page.
    pub start_at: usize,
}

/// A paginated issue search.
#[async_trait]
pub trait IssueSearch: Send + Sync {
    async fn search(&self, jql: &str, page: PageRequest) -> Result<SearchPage>;
}

/// Minute-granularity timestamp accepted by JQL date comparisons.
pub fn format_watermark<Tz: TimeZone>(ts: DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Filter for issues of `project` updated strictly after `since`.
///
/// JQL reads bare dates in the querying user's time zone, so callers pass
/// `since` already converted to it.
pub fn build_jql<Tz: TimeZone>(project: &str, since: DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "project = '{}' AND updated > '{}'",
        project,
        format_watermark(since)
    )
}

/// Fetch every issue of `project` updated after `since`.
///
/// The filter is rendered in the process's local time zone, which must
/// match the Jira account's profile setting. A local zone ahead of the
/// profile zone skips updates made in the gap.
///
/// Returns [`SyncError::Fetch`] if any page fails, or if a page comes back
/// empty before the reported total is reached.
pub async fn fetch_updated_since(
    search: &dyn IssueSearch,
    project: &str,
    since: DateTime<Utc>,
    page_size: usize,
) -> Result<Vec<RemoteIssue>, SyncError> {
    let jql = build_jql(project, since.with_timezone(&Local));
    let mut issues: Vec<RemoteIssue> = Vec::new();
    let mut total: Option<usize> = None;
    let mut next_offset = 0usize;

    loop {
        let request = PageRequest {
            start_at: next_offset,
            max_results: page_size,
        };
        let page = search
            .search(&jql, request)
            .await
            .map_err(|source| SyncError::Fetch {
                offset: next_offset,
                source,
            })?;

        let expected = *total.get_or_insert(page.total);
        if issues.is_empty() {
            issues.reserve(expected.min(page_size));
        }

        let batch_len = page.issues.len();
        next_offset = page.start_at + batch_len;
        issues.extend(page.issues);
        debug!(total = expected, next_offset, "issue page received");

        if issues.len() >= expected {
            break;
        }

        if batch_len == 0 {
            return Err(SyncError::Fetch {
                offset: next_offset,
                source: anyhow::anyhow!(
                    "empty page before reaching total ({} of {})",
                    issues.len(),
                    expected
                ),
            });
        }
    }

    Ok(issues)
}
