//! # jira-index CLI (`jidx`)
//!
//! ## Usage
//!
//! ```bash
//! jidx --config ./config/jidx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `jidx init` | Create the store and the `jira` full-text table |
//! | `jidx sync` | Poll Jira and upsert changed issues until Ctrl-C |
//! | `jidx sync --once` | Run a single sync cycle |
//! | `jidx search "<query>"` | Substring search across every column |
//! | `jidx get <key>` | Print one stored issue |
//!
//! Logging is controlled with `RUST_LOG` (default `jira_index=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use jira_index::{config, get, migrate, search, syncer};

/// jira-index: a local, full-text searchable mirror of a Jira project.
#[derive(Parser)]
#[command(
    name = "jidx",
    about = "jira-index: keep a trigram-searchable SQLite copy of a Jira project",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/jidx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store and its full-text table.
    ///
    /// Safe to run repeatedly; an existing table is left as is.
    Init,

    /// Poll Jira and upsert every issue updated since the last cycle.
    ///
    /// Reads credentials from `JIRA_EMAIL` and `JIRA_TOKEN`.
    Sync {
        /// Run a single cycle and exit.
        #[arg(long)]
        once: bool,
    },

    /// Search stored issues (trigram substring match).
    Search {
        /// FTS5 match expression.
        query: String,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print one stored issue.
    Get {
        /// Issue key, e.g. `TI-1234`.
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jira_index=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let status = migrate::run_migrations(&cfg).await?;
            match status {
                migrate::SchemaStatus::Created => println!("Store initialized."),
                migrate::SchemaStatus::AlreadyExists => println!("Store already initialized."),
            }
        }
        Commands::Sync { once } => {
            syncer::run_sync(&cfg, once).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Get { key } => {
            get::run_get(&cfg, &key).await?;
        }
    }

    Ok(())
}
