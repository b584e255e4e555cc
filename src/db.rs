use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;
use crate::error::{Result, SyncError};

/// Open (creating if needed) the store file named in `[db] path`.
///
/// WAL journaling lets an external reader query the file while a sync is
/// writing to it.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;
    let open_err = |source| SyncError::StoreOpen {
        path: db_path.clone(),
        source,
    };

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| open_err(sqlx::Error::Io(e)))?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .map_err(open_err)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(open_err)?;

    Ok(pool)
}
