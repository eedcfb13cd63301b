//! Error types for data validation in roomsense-types.

use thiserror::Error;

/// Errors that can occur when validating sensor data.
///
/// This error type is transport-agnostic and does not include
/// feed- or storage-specific errors (those belong in roomsense-core
/// and roomsense-store).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A field holds a value outside its valid range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias using roomsense-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
