//! IRD Format Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A format error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input is smaller than the smallest possible IRD container.
    #[display("data is too small to be a valid IRD structure ({_0} bytes)")]
    TooSmall(#[error(not(source))] usize),
    /// Input is neither a raw IRD container nor a gzip stream wrapping one.
    #[display("not a valid IRD file")]
    InvalidMagic,
    /// The gzip wrapper could not be decompressed.
    #[display("invalid or corrupted gzip stream")]
    Decompress,
    /// The container ended before the named field could be read.
    #[display("unexpected end of data while reading '{field}'")]
    Truncated {
        /// The field being read when the data ran out.
        field: &'static str,
    },
    /// The trailing CRC32 does not match the container contents.
    #[display("corrupted IRD data, expected {expected:08x}, but was {actual:08x}")]
    ChecksumMismatch {
        /// Checksum stored in the container.
        expected: u32,
        /// Checksum calculated over the container contents.
        actual: u32,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The bytes are either a valid container or they aren't; fetching
        // them again is the caller's business.
        false
    }
}
