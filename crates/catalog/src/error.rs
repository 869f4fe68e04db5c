//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configured base URL is unusable.
    #[display("invalid catalog URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Connection, timeout, or body read failure.
    #[display("transport error: {_0}")]
    Transport(#[error(not(source))] String),
    /// The server answered with a non-2xx status.
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// The search response wasn't the expected JSON.
    #[display("invalid search response: {_0}")]
    Deserialize(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => *status >= 500 || *status == 429,
            Self::InvalidUrl(_) | Self::Deserialize(_) => false,
        }
    }
}
