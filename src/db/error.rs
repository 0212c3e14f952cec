use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the photo store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("photo {id} is malformed: {reason}")]
    Corrupt { id: i64, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
