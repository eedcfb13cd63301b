//! Error types for roomsense-core.
//!
//! # Recovery strategies
//!
//! | Error type | Strategy |
//! |------------|----------|
//! | [`Error::Feed`] | Recovered by the sync engine via backoff retry; observers see a status change, not an error |
//! | [`Error::Storage`] | Not recovered internally; propagated to the caller of the triggering operation |
//! | [`Error::Cancelled`] | Intentional; do not retry |
//! | [`Error::InvalidConfig`] | Fix the configuration and restart |

use thiserror::Error;

/// Errors that can occur in the sync/alerting core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The remote room feed reported a failure.
    #[error("Feed error: {0}")]
    Feed(String),

    /// The local snapshot cache failed.
    #[error("Storage error: {0}")]
    Storage(#[from] roomsense_store::Error),

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a feed error with a message.
    pub fn feed(message: impl Into<String>) -> Self {
        Self::Feed(message.into())
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type alias using roomsense-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
