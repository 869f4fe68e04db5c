//! Configuration Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration source couldn't be read or didn't match the expected shape.
    #[display("could not load configuration: {_0}")]
    Load(#[error(not(source))] String),
    /// A setting was read but its value is unusable; names the setting.
    #[display("invalid value for '{_0}'")]
    InvalidValue(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Configuration errors need the user to fix something first.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
