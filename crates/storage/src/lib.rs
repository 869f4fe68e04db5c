//! Storage for the IRD cache directory.
//!
//! The cache is a flat directory: every entry is addressed by its bare
//! filename, there are no subdirectories, and the directory listing is the
//! only index.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
