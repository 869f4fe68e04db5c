//! Compat Client Error Types

use derive_more::{Display, Error};

/// A compat client error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for compat client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configured endpoint URL is unusable.
    #[display("invalid API URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Connection, timeout, non-2xx status, or body read failure.
    #[display("transport error: {_0}")]
    Transport(#[error(not(source))] String),
    /// The response body wasn't the expected JSON.
    #[display("invalid API response: {_0}")]
    Deserialize(#[error(not(source))] String),
    /// Every attempt failed.
    #[display("couldn't communicate with the API after {attempts} attempts")]
    CommunicationFailure { attempts: u32 },
    /// The caller cancelled the request.
    #[display("request cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Only meaningful within a single attempt: once the executor gives up
    /// with [`CommunicationFailure`](Self::CommunicationFailure) the caller
    /// should not loop again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Deserialize(_))
    }
}
