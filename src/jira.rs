//! Jira REST client and remote issue types.
//!
//! Talks to the `GET /rest/api/2/search` endpoint with basic auth (account
//! email + API token). Only the fields the transformer consumes are requested
//! and modelled; everything else in the payload is ignored by serde.
//!
//! # Environment Variables
//!
//! - `JIRA_EMAIL`: required
//! - `JIRA_TOKEN`: required
//!
//! # Timestamps
//!
//! Jira encodes times as `2021-10-03T18:16:51.611+0000`. [`JiraTime`] parses
//! that form and re-encodes it the same way (quoted, millisecond precision,
//! trailing fractional zeros trimmed), which is how timestamps are stored.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::config::JiraConfig;
use crate::fetch::{IssueSearch, PageRequest, SearchPage};

/// Fields requested from the search endpoint.
pub const SEARCH_FIELDS: [&str; 13] = [
    "assignee",
    "comment",
    "created",
    "creator",
    "description",
    "fixVersions",
    "issuelinks",
    "issuetype",
    "priority",
    "project",
    "status",
    "summary",
    "updated",
];

// ============ Remote Types ============

/// One issue as returned by the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteIssue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creator: Option<User>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub comment: Option<CommentPage>,
    #[serde(default)]
    pub created: Option<JiraTime>,
    #[serde(default)]
    pub updated: Option<JiraTime>,
    #[serde(default)]
    pub fix_versions: Vec<FixVersion>,
    #[serde(default, rename = "issuetype")]
    pub issue_type: Option<Named>,
    #[serde(default)]
    pub priority: Option<Named>,
    #[serde(default)]
    pub status: Option<Named>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub author: User,
    #[serde(default)]
    pub body: String,
    /// Kept exactly as sent; rendered verbatim in comment headers.
    #[serde(default)]
    pub created: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixVersion {
    pub name: String,
}

/// Any `{ "name": ... }` object (issue type, priority, status).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: String,
}

// ============ JiraTime ============

/// Jira's timestamp type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JiraTime(pub DateTime<FixedOffset>);

const JIRA_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

impl JiraTime {
    pub fn parse(s: &str) -> Result<Self> {
        DateTime::parse_from_str(s, JIRA_TIME_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(s))
            .map(JiraTime)
            .with_context(|| format!("invalid Jira timestamp: {}", s))
    }

    /// Native JSON encoding: `"2021-10-03T18:16:51.611+0000"`, quotes included.
    pub fn encode(&self) -> String {
        let millis = self.0.timestamp_subsec_millis();
        let frac = if millis == 0 {
            String::new()
        } else {
            format!(".{:03}", millis).trim_end_matches('0').to_string()
        };
        format!(
            "\"{}{}{}\"",
            self.0.format("%Y-%m-%dT%H:%M:%S"),
            frac,
            self.0.format("%z")
        )
    }
}

impl<'de> Deserialize<'de> for JiraTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        JiraTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============ Search Response ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    start_at: usize,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<RemoteIssue>,
}

// ============ Client ============

/// Authenticated client bound to one Jira base URL.
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    token: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig, email: String, token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email,
            token,
        })
    }

    /// Build a client with credentials from `JIRA_EMAIL` and `JIRA_TOKEN`.
    pub fn from_env(config: &JiraConfig) -> Result<Self> {
        let email =
            std::env::var("JIRA_EMAIL").context("JIRA_EMAIL environment variable not set")?;
        let token =
            std::env::var("JIRA_TOKEN").context("JIRA_TOKEN environment variable not set")?;
        Self::new(config, email, token)
    }
}

#[async_trait]
impl IssueSearch for JiraClient {
    async fn search(&self, jql: &str, page: PageRequest) -> Result<SearchPage> {
        let url = format!("{}/rest/api/2/search", self.base_url);

        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.email, Some(&self.token))
            .query(&[
                ("jql", jql.to_string()),
                ("startAt", page.start_at.to_string()),
                ("maxResults", page.max_results.to_string()),
                ("fields", SEARCH_FIELDS.join(",")),
            ])
            .send()
            .await
            .with_context(|| format!("Jira search request failed: {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Jira search failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .context("Failed to decode Jira search response")?;

        Ok(SearchPage {
            issues: parsed.issues,
            total: parsed.total,
            start_at: parsed.start_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_keeps_native_precision() {
        let t = JiraTime::parse("2021-10-03T18:16:51.611+0000").unwrap();
        assert_eq!(t.encode(), "\"2021-10-03T18:16:51.611+0000\"");
    }

    #[test]
    fn test_encode_trims_fraction_zeros() {
        let t = JiraTime::parse("2021-10-03T18:16:51.500-0700").unwrap();
        assert_eq!(t.encode(), "\"2021-10-03T18:16:51.5-0700\"");

        let t = JiraTime::parse("2021-10-03T18:16:51.000+0200").unwrap();
        assert_eq!(t.encode(), "\"2021-10-03T18:16:51+0200\"");
    }

    #[test]
    fn test_parse_rfc3339_fallback() {
        let t = JiraTime::parse("2021-10-03T18:16:51.611Z").unwrap();
        assert_eq!(t.encode(), "\"2021-10-03T18:16:51.611+0000\"");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(JiraTime::parse("yesterday").is_err());
    }

    #[test]
    fn test_deserialize_sparse_issue() {
        let issue: RemoteIssue = serde_json::from_value(serde_json::json!({
            "key": "TI-1",
            "fields": {
                "summary": "Crash on boot",
                "description": null,
                "assignee": null,
                "created": "2021-10-03T18:16:51.611+0000",
                "issuetype": { "name": "Bug" }
            }
        }))
        .unwrap();

        assert_eq!(issue.key, "TI-1");
        assert!(issue.fields.description.is_none());
        assert!(issue.fields.assignee.is_none());
        assert!(issue.fields.comment.is_none());
        assert!(issue.fields.fix_versions.is_empty());
        assert_eq!(issue.fields.issue_type.unwrap().name, "Bug");
    }

    #[test]
    fn test_deserialize_search_response() {
        let resp: SearchResponse = serde_json::from_value(serde_json::json!({
            "startAt": 2,
            "maxResults": 2,
            "total": 5,
            "issues": [{ "key": "TI-3", "fields": {} }, { "key": "TI-4" }]
        }))
        .unwrap();

        assert_eq!(resp.start_at, 2);
        assert_eq!(resp.total, 5);
        assert_eq!(resp.issues.len(), 2);
    }
}
