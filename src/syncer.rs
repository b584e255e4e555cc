//! Sync cycles and the polling loop.
//!
//! A [`Syncer`] owns everything one sync needs: the remote search client,
//! the store writer and the watermark. Cycles run strictly one after another:
//!
//! ```text
//! run_cycle:  fetch (all pages) ──▶ transform ──▶ upsert each ──▶ advance watermark
//!                  │
//!                  └─ page error: return, nothing written, watermark kept
//! ```
//!
//! [`Syncer::run`] performs one cycle immediately and one per interval after
//! that. Shutdown is only noticed while waiting between cycles; an in-flight
//! fetch or write batch always runs to completion.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::error::SyncError;
use crate::fetch::{fetch_updated_since, IssueSearch};
use crate::jira::JiraClient;
use crate::migrate;
use crate::models::IssueRecord;
use crate::transform::to_record;
use crate::watermark::Watermark;
use crate::writer::{IndexWriter, WriteSummary};

/// Outcome of one successful cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Captured before the fetch; the watermark moves here.
    pub started_at: DateTime<Utc>,
    pub fetched: usize,
    pub written: WriteSummary,
}

pub struct Syncer {
    search: Box<dyn IssueSearch>,
    writer: IndexWriter,
    watermark: Watermark,
    project: String,
    page_size: usize,
    automation_author: String,
    interval: Duration,
}

impl Syncer {
    pub fn new(config: &Config, search: Box<dyn IssueSearch>, pool: SqlitePool) -> Self {
        Self {
            search,
            writer: IndexWriter::new(pool, config.store.updated_on_rewrite),
            watermark: Watermark::default(),
            project: config.jira.project.clone(),
            page_size: config.jira.page_size,
            automation_author: config.jira.automation_author.clone(),
            interval: Duration::from_secs(config.sync.interval_secs),
        }
    }

    /// Start from `watermark` instead of the epoch.
    pub fn with_watermark(mut self, watermark: Watermark) -> Self {
        self.watermark = watermark;
        self
    }

    /// Override the wait between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    pub fn pool(&self) -> &SqlitePool {
        self.writer.pool()
    }

    /// Fetch everything updated since the watermark and upsert it.
    ///
    /// A fetch failure returns before anything is written and leaves the
    /// watermark untouched. Individual write failures are logged and counted
    /// in the report; they do not hold the watermark back.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SyncError> {
        let started_at = Utc::now();

        let issues = fetch_updated_since(
            self.search.as_ref(),
            &self.project,
            self.watermark.get(),
            self.page_size,
        )
        .await?;
        info!(len = issues.len(), "got new issues");

        let records: Vec<IssueRecord> = issues
            .iter()
            .map(|issue| to_record(issue, &self.automation_author))
            .collect();
        let written = self.writer.write_all(&records).await;

        self.watermark.advance(started_at);

        Ok(CycleReport {
            started_at,
            fetched: issues.len(),
            written,
        })
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        self.logged_cycle().await;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    info!("shutdown requested");
                    break;
                }
            }

            self.logged_cycle().await;
        }
    }

    async fn logged_cycle(&mut self) {
        match self.run_cycle().await {
            Ok(report) => info!(
                fetched = report.fetched,
                inserted = report.written.inserted,
                updated = report.written.updated,
                failed = report.written.failed,
                "sync cycle complete"
            ),
            Err(e) => error!(error = %e, "failed to update issues"),
        }
    }
}

/// CLI entry point: open the store, ensure the schema and poll Jira.
///
/// With `once`, a single cycle runs and its fetch error (if any) is
/// returned; otherwise the loop runs until Ctrl-C.
pub async fn run_sync(config: &Config, once: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::ensure_schema(&pool).await?;

    let client = JiraClient::from_env(&config.jira)?;
    let mut syncer = Syncer::new(config, Box::new(client), pool.clone());

    if once {
        let report = syncer.run_cycle().await;
        pool.close().await;
        let report = report?;
        println!("sync {}", config.jira.project);
        println!("  fetched: {} issues", report.fetched);
        println!("  inserted: {}", report.written.inserted);
        println!("  updated: {}", report.written.updated);
        println!("  failed: {}", report.written.failed);
        println!("ok");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive so the loop is not torn down.
                error!(error = %e, "unable to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });

    info!(
        project = %config.jira.project,
        interval_secs = config.sync.interval_secs,
        "starting sync loop"
    );
    syncer.run(shutdown_rx).await;

    pool.close().await;
    Ok(())
}
