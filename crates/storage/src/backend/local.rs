//! Local filesystem storage backend.
//!
//! Files live directly inside a configured directory and are accessed using
//! `tokio::fs` for async I/O.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

/// Local filesystem storage backend.
///
/// Stores files in a single directory on the local filesystem. All paths are
/// bare filenames inside the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use ird_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/path/to/ird/cache")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Cache directory
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// The directory doesn't have to exist yet: listing a missing directory
    /// reports [`NotFound`](ErrorKind::NotFound), and the first write
    /// creates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || (root.exists() && !root.is_dir()) {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a cache filename.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Read the whole directory before yielding anything so the listing
    /// comes out sorted; cache directories hold a handful of files per
    /// product.
    async fn sorted_entries(root: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = fs::read_dir(root).await.map_err(|e| Self::map_io_error(e, root))?;
        let mut collected = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, root))? {
            collected.push(entry);
        }
        collected.sort_by_key(|entry| entry.file_name());
        Ok(collected)
    }

    /// Keeps the `?` operator usable outside of the stream body; what a
    /// failure means is up to [`listed`](Self::listed).
    async fn process_entry(entry: &DirEntry) -> Result<Option<FileInfo>> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        if !metadata.is_file() {
            // Subdirectories aren't part of the cache, and what is most
            // likely a broken symlink gets silently dropped.
            return Ok(None);
        }
        let modified = metadata.modified().map_err(ErrorKind::Io)?;
        Ok(Some(FileInfo::new(entry.file_name(), metadata.len(), modified)))
    }

    /// An entry that can't be inspected (usually removed after the directory
    /// was read) is dropped on its own; the rest of the listing carries on.
    async fn listed(&self, entry: &DirEntry) -> Option<FileInfo> {
        match Self::process_entry(entry).await {
            Ok(info) => info,
            Err(err) => {
                tracing::warn!(
                    backend = %self.name,
                    path = %entry.path().display(),
                    error = %err,
                    "skipping unreadable cache entry"
                );
                None
            },
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            match Self::sorted_entries(&self.root).await {
                Ok(entries) => {
                    for entry in entries {
                        if let Some(info) = self.listed(&entry).await {
                            yield Ok(info);
                        }
                    }
                },
                Err(e) => yield Err(e),
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let full_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&full_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let full_path = self.absolute_path(path)?;
        Ok(fs::read(&full_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.absolute_path(path)?;
        tracing::debug!(backend = %self.name, path = %full_path.display(), bytes = data.len(), "writing cached file");
        fs::create_dir_all(&self.root).await.map_err(|e| Self::map_io_error(e, &self.root))?;
        Ok(fs::write(&full_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("cache", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("cache", "relative/path").is_err());
        assert!(LocalBackend::new("cache", "./relative").is_err());
    }

    #[test]
    fn test_new_rejects_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("not-a-directory");
        std::fs::write(&file, b"data").unwrap();
        assert!(LocalBackend::new("cache", &file).is_err());
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path()).unwrap();
        let expected = temp_dir.path().join("BLES01234-AB.ird");
        assert_eq!(backend.absolute_path(Path::new("BLES01234-AB.ird")).unwrap(), expected);
        // Path traversal is prevented
        assert!(backend.absolute_path(Path::new("../etc/passwd")).is_err());
        // So are subdirectories
        assert!(backend.absolute_path(Path::new("sub/file.ird")).is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path()).unwrap();
        let data = b"\x1f\x8b\x08\x00 not really gzip";
        backend.write(Path::new("BLES01234-AB.ird"), data).await.unwrap();
        let read_data = backend.read(Path::new("BLES01234-AB.ird")).await.unwrap();
        assert_eq!(read_data, data);
        // Byte-for-byte on disk, too.
        assert_eq!(std::fs::read(temp_dir.path().join("BLES01234-AB.ird")).unwrap(), data);
    }

    #[tokio::test]
    async fn test_write_creates_cache_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("ird-cache");
        let backend = LocalBackend::new("cache", &root).unwrap();
        backend.write(Path::new("file.ird"), b"data").await.unwrap();
        assert!(root.join("file.ird").is_file());
    }

    #[tokio::test]
    async fn test_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path()).unwrap();
        assert!(!backend.exists(Path::new("nonexistent.ird")).await.unwrap());
        backend.write(Path::new("exists.ird"), b"data").await.unwrap();
        assert!(backend.exists(Path::new("exists.ird")).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path()).unwrap();
        let err = backend.read(Path::new("missing.ird")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path()).unwrap();
        let files = backend.list().await.unwrap();
        assert_eq!(files.len(), 0);
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path().join("missing")).unwrap();
        let err = backend.list().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_flat_and_sorted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path()).unwrap();
        backend.write(Path::new("c.ird"), b"data").await.unwrap();
        backend.write(Path::new("a.ird"), b"data").await.unwrap();
        backend.write(Path::new("b.txt"), b"data").await.unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        std::fs::write(temp_dir.path().join("nested/d.ird"), b"data").unwrap();
        let files = backend.list().await.unwrap();
        let names: Vec<_> = files.iter().filter_map(FileInfo::file_name).collect();
        assert_eq!(names, vec!["a.ird", "b.txt", "c.ird"]);
    }

    #[tokio::test]
    async fn test_entry_removed_during_listing_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path()).unwrap();
        backend.write(Path::new("a.ird"), b"data").await.unwrap();
        backend.write(Path::new("b.ird"), b"data").await.unwrap();
        let entries = LocalBackend::sorted_entries(temp_dir.path()).await.unwrap();
        std::fs::remove_file(temp_dir.path().join("a.ird")).unwrap();

        assert!(LocalBackend::process_entry(&entries[0]).await.is_err());
        assert!(backend.listed(&entries[0]).await.is_none());
        let kept = backend.listed(&entries[1]).await.unwrap();
        assert_eq!(kept.file_name(), Some("b.ird"));
    }

    #[tokio::test]
    async fn test_path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("cache", temp_dir.path()).unwrap();
        // Attempts to escape the root should fail
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.read(Path::new("etc/../../passwd")).await.is_err());
        assert!(backend.write(Path::new("../etc/passwd"), b"data").await.is_err());
    }
}
