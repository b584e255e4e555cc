//! Error taxonomy for the sync core.
//!
//! Each variant maps to one failure policy:
//!
//! | Variant | Policy |
//! |---------|--------|
//! | [`SyncError::Fetch`] | aborts the cycle, watermark kept, window retried next cycle |
//! | [`SyncError::Write`] | logged per issue, cycle continues, watermark still advances |
//! | [`SyncError::Schema`] | fatal at startup |
//! | [`SyncError::StoreOpen`] | fatal at startup |

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A page of the remote search could not be retrieved.
    #[error("fetch failed at offset {offset}: {source}")]
    Fetch {
        offset: usize,
        #[source]
        source: anyhow::Error,
    },

    /// One record could not be written to the store.
    #[error("write failed for {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: sqlx::Error,
    },

    /// The full-text table could not be created.
    #[error("schema creation failed: {0}")]
    Schema(#[source] sqlx::Error),

    /// The store file could not be opened.
    #[error("cannot open store at {}: {source}", .path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
