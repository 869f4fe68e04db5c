//! In-memory catalog for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::Catalog;
use crate::error::{ErrorKind, Result};
use crate::models::{IrdFilename, SearchResult, SearchResultItem};

/// In-memory [`Catalog`] for testing.
///
/// Every search returns the same rows, whatever the query. Downloads serve
/// registered bytes; unknown filenames answer with HTTP 404.
///
/// # Examples
///
/// ```
/// use ird_catalog::{Catalog, IrdFilename, mock::MockCatalog};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let catalog = MockCatalog::default().with_ird("BLES01234-AB.ird", "Game", b"3IRD...".to_vec());
/// let result = catalog.search("BLES01234").await.unwrap();
/// assert_eq!(result.items[0].title.as_deref(), Some("Game"));
/// let bytes = catalog.download(&IrdFilename::new("BLES01234-AB.ird")).await.unwrap();
/// assert_eq!(bytes, b"3IRD...");
/// # }
/// ```
#[derive(Default)]
pub struct MockCatalog {
    items: Vec<SearchResultItem>,
    unavailable: bool,
    downloads: HashMap<IrdFilename, Option<Vec<u8>>>,
    searches: AtomicUsize,
    downloaded: Mutex<Vec<IrdFilename>>,
}

impl MockCatalog {
    /// A catalog whose searches always fail with a transport error.
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::default() }
    }

    /// Add a search row with a download link to `filename`, and serve
    /// `bytes` for it.
    pub fn with_ird(self, filename: &str, title: &str, bytes: Vec<u8>) -> Self {
        self.with_row(title, format!(r#"<a href="ird/{filename}">{filename}</a>"#))
            .with_download(filename, bytes)
    }

    /// Add a search row from raw cell HTML, without any download.
    pub fn with_row(mut self, title_html: &str, filename_html: impl Into<String>) -> Self {
        let id = Some(self.items.len().to_string());
        self.items.push(SearchResultItem::from_html(id, title_html, filename_html));
        self
    }

    /// Serve `bytes` when `filename` is downloaded.
    pub fn with_download(mut self, filename: &str, bytes: Vec<u8>) -> Self {
        self.downloads.insert(IrdFilename::new(filename), Some(bytes));
        self
    }

    /// Fail with a transport error when `filename` is downloaded.
    pub fn with_failing_download(mut self, filename: &str) -> Self {
        self.downloads.insert(IrdFilename::new(filename), None);
        self
    }

    /// Number of searches so far, failed ones included.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    /// Every download request so far, failed ones included, in order.
    pub fn downloaded(&self) -> Vec<IrdFilename> {
        self.downloaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search(&self, _query: &str) -> Result<SearchResult> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            exn::bail!(ErrorKind::Transport("connection refused".to_string()));
        }
        Ok(SearchResult { items: self.items.clone(), ..SearchResult::default() })
    }

    async fn download(&self, filename: &IrdFilename) -> Result<Vec<u8>> {
        self.downloaded.lock().unwrap().push(filename.clone());
        match self.downloads.get(filename) {
            Some(Some(bytes)) => Ok(bytes.clone()),
            Some(None) => exn::bail!(ErrorKind::Transport("connection reset".to_string())),
            None => exn::bail!(ErrorKind::Status(404)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_and_download() {
        let catalog = MockCatalog::default()
            .with_ird("BLES01234-AB.ird", "Game", b"ird".to_vec())
            .with_row("Broken", "<a>no link</a>");
        let result = catalog.search("anything").await.unwrap();
        assert_eq!(result.items.len(), 2);
        assert!(result.items[1].filename.is_none());
        // Lookups ignore case, like the catalog's own filenames.
        assert_eq!(catalog.download(&IrdFilename::new("bles01234-ab.ird")).await.unwrap(), b"ird");
        assert_eq!(catalog.search_count(), 1);
        assert_eq!(catalog.downloaded().len(), 1);
    }

    #[tokio::test]
    async fn test_failures() {
        let catalog = MockCatalog::unavailable().with_failing_download("BLES01234-AB.ird");
        assert!(matches!(&*catalog.search("x").await.unwrap_err(), ErrorKind::Transport(_)));
        let err = catalog.download(&IrdFilename::new("BLES01234-AB.ird")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Transport(_)));
        let err = catalog.download(&IrdFilename::new("OTHER0000-00.ird")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Status(404));
    }
}
