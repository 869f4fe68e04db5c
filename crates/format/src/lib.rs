//! IRD container parsing.
//!
//! An IRD file describes a PS3 game disc: its product code, title, versions,
//! the encrypted ISO header and footer sectors, and an MD5 digest for every
//! region and file on the disc. Files are distributed gzip-compressed; both
//! compressed and raw containers are accepted by [`parse`].

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod models;
mod parse;

pub use crate::models::{Ird, IrdFile, Md5, PIC_LENGTH};
pub use crate::parse::{MIN_CONTAINER_SIZE, parse};
