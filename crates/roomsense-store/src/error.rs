//! Error types for roomsense-store.

use std::path::PathBuf;

/// Result type for roomsense-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in roomsense-store.
///
/// Cache failures are not recovered internally; they propagate to the
/// caller of the triggering operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create the database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
