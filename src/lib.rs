//! # jira-index
//!
//! Keeps a local, trigram-indexed SQLite copy of one Jira project up to date
//! by polling the Jira search API.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  Jira REST │──▶│   Fetcher    │──▶│ Transformer │──▶│  Writer   │
//! │  /search   │   │ (paginated) │   │ (flatten)   │   │ (upsert) │
//! └────────────┘   └─────────────┘   └─────────────┘   └────┬─────┘
//!                        ▲                                  ▼
//!                   watermark                       SQLite FTS5 `jira`
//!                        └──── Syncer (5 s loop) ◀────────  │
//!                                                           ▼
//!                                                  readers (`MATCH`)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export JIRA_EMAIL=me@example.com JIRA_TOKEN=...
//! jidx init                     # create the store
//! jidx sync                     # poll until Ctrl-C
//! jidx search "encoder"         # substring search across all columns
//! jidx get TI-1234              # show one issue
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Store connection |
//! | [`migrate`] | `jira` table schema |
//! | [`error`] | Sync error taxonomy |
//! | [`jira`] | Jira REST client and remote types |
//! | [`fetch`] | Watermark-filtered pagination |
//! | [`markup`] | Jira wiki markup → Markdown |
//! | [`transform`] | Remote issue → store row |
//! | [`writer`] | Keyed upserts |
//! | [`watermark`] | Sync progress mark |
//! | [`syncer`] | Sync cycle and polling loop |
//! | [`search`] | Read-only `MATCH` queries |
//! | [`get`] | Issue lookup by key |
//! | [`models`] | Store row type |

pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod get;
pub mod jira;
pub mod markup;
pub mod migrate;
pub mod models;
pub mod search;
pub mod syncer;
pub mod transform;
pub mod watermark;
pub mod writer;
