//! IRD Library catalog.
//!
//! The catalog is a website listing every known IRD file. Its search
//! endpoint answers DataTables queries with rows of HTML fragments; this
//! crate sends those queries, pulls filenames and titles out of the
//! fragments, and downloads the files themselves.

mod client;
mod consts;
pub mod error;
pub mod extract;
#[cfg(feature = "mock")]
pub mod mock;
mod models;
pub mod query;

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::client::{CatalogClient, DEFAULT_BASE_URL};
use crate::error::Result;
pub use crate::models::{IrdFilename, SearchResult, SearchResultItem};

pub type CatalogHandle = Arc<dyn Catalog + Send + Sync>;

/// Remote source of IRD files.
///
/// Each call is a single attempt. Cancel a call by dropping its future.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Search the catalog. Queries are usually a product code.
    async fn search(&self, query: &str) -> Result<SearchResult>;

    /// Fetch the bytes of an IRD file, exactly as served.
    async fn download(&self, filename: &IrdFilename) -> Result<Vec<u8>>;
}
