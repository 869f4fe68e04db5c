//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface over the IRD cache directory: the local filesystem in
//! production, and an in-memory map in tests.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for the cache directory.
///
/// All operations are asynchronous. The cache is flat, so every path is a
/// bare filename and must pass [`validate_path`](crate::validate_path);
/// implementations enforce this.
///
/// Nothing here locks: two processes writing the same filename will race,
/// and the last write wins.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ird_storage::{backend::StorageBackend, error::Result};
///
/// async fn size_of_cached_file(backend: &dyn StorageBackend) -> Result<u64> {
///     let path = Path::new("BLES01234-1A2B3C4D.ird");
///     if backend.exists(path).await? {
///         let data = backend.read(path).await?;
///         Ok(data.len() as u64)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// List every file in the cache directory.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self) -> Result<Vec<FileInfo>> {
        self.list_stream().try_collect().await
    }

    /// Stream file metadata for every file in the cache directory, ordered
    /// by filename.
    ///
    /// A cache directory that can't be listed at all (missing, not
    /// readable) yields a single error and ends the stream. A single entry
    /// that can't be inspected is skipped instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use ird_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream();
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.path.display(), info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream(&self) -> FileInfoStream<'_>;

    /// Check if a file exists. The lookup is exact; whether it ignores case
    /// depends on the underlying filesystem.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided
    /// data. Implementations create the cache directory itself if needed.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use ird_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend, bytes: &[u8]) -> Result<()> {
    /// backend.write(Path::new("BLES01234-1A2B3C4D.ird"), bytes).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
