//! Download missing files and write them through to the cache.

use ird_catalog::{Catalog, IrdFilename};
use ird_format::Ird;
use ird_storage::BackendHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::cancel::cancellable;
use crate::error::Result;
use crate::observer::{Event, Observer};
use crate::outcome::{Issue, Outcome};

/// Downloads each file in turn, parses it, and caches the raw bytes.
///
/// Each file gets exactly one attempt: a failed download is reported and
/// skipped. Unlike the compatibility API clients, nothing here retries.
/// Files that don't parse are never cached. A failed cache write is reported but the record is still
/// returned.
///
/// Only cancellation is an error; files written before it stay cached.
#[instrument(skip_all, fields(backend = backend.name(), files = filenames.len()))]
pub async fn fetch_and_persist(
    catalog: &dyn Catalog,
    backend: &BackendHandle,
    filenames: &[IrdFilename],
    cancel: &CancellationToken,
    observer: &dyn Observer,
) -> Result<Outcome<Vec<Ird>>> {
    let mut records = Vec::with_capacity(filenames.len());
    let mut issues = Vec::new();
    for filename in filenames {
        let bytes = match cancellable(cancel, catalog.download(filename)).await? {
            Ok(bytes) => bytes,
            Err(err) => {
                issues.push(Issue::DownloadFailed { filename: filename.clone(), reason: err.to_string() });
                continue;
            },
        };
        observer.observe(Event::Downloaded { filename, bytes: bytes.len() });
        let record = match ird_format::parse(&bytes) {
            Ok(record) => record,
            Err(err) => {
                issues.push(Issue::CorruptDownload { filename: filename.clone(), reason: err.to_string() });
                continue;
            },
        };
        if let Err(err) = backend.write(filename.as_path(), &bytes).await {
            issues.push(Issue::PersistFailed { filename: filename.clone(), reason: err.to_string() });
        }
        records.push(record);
    }
    Ok(Outcome::from_parts(records, issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::observer::TracingObserver;
    use ird_catalog::mock::MockCatalog;
    use ird_format::mock::{encode, sample};
    use ird_storage::backend::MockBackend;
    use std::path::Path;
    use std::sync::Arc;

    fn filenames(names: &[&str]) -> Vec<IrdFilename> {
        names.iter().copied().map(IrdFilename::new).collect()
    }

    #[tokio::test]
    async fn test_partial_failures_are_isolated() {
        let catalog = MockCatalog::default()
            .with_download("BLES01234-AA.ird", encode(&sample("BLES01234", "Good")))
            .with_failing_download("BLES01234-BB.ird")
            .with_download("BLES01234-CC.ird", b"not an ird".to_vec());
        let mock = Arc::new(MockBackend::default());
        let backend: BackendHandle = mock.clone();
        let cancel = CancellationToken::new();
        let wanted = filenames(&["BLES01234-AA.ird", "BLES01234-BB.ird", "BLES01234-CC.ird"]);
        let outcome = fetch_and_persist(&catalog, &backend, &wanted, &cancel, &TracingObserver).await.unwrap();

        assert_eq!(outcome.value().unwrap().len(), 1);
        assert!(matches!(
            outcome.issues(),
            [Issue::DownloadFailed { .. }, Issue::CorruptDownload { .. }]
        ));
        // Only the valid file is cached.
        assert_eq!(mock.write_count(), 1);
        assert!(mock.contents("BLES01234-CC.ird").await.is_none());
        // Sequential, one attempt each.
        assert_eq!(catalog.downloaded(), wanted);
    }

    #[tokio::test]
    async fn test_downloaded_bytes_are_cached_exactly() {
        let bytes = encode(&sample("BLES01234", "Exact"));
        let catalog = MockCatalog::default().with_download("BLES01234-AA.ird", bytes.clone());
        let temp_dir = tempfile::tempdir().unwrap();
        let backend: BackendHandle =
            Arc::new(ird_storage::backend::LocalBackend::new("local", temp_dir.path()).unwrap());
        let cancel = CancellationToken::new();
        let wanted = filenames(&["BLES01234-AA.ird"]);
        let outcome = fetch_and_persist(&catalog, &backend, &wanted, &cancel, &TracingObserver).await.unwrap();
        assert!(outcome.is_complete());
        assert_eq!(std::fs::read(temp_dir.path().join("BLES01234-AA.ird")).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_record() {
        let catalog = MockCatalog::default().with_download("BLES01234-AA.ird", encode(&sample("BLES01234", "Kept")));
        let backend: BackendHandle = Arc::new(MockBackend::default().with_failing_writes());
        let cancel = CancellationToken::new();
        let wanted = filenames(&["BLES01234-AA.ird"]);
        let outcome = fetch_and_persist(&catalog, &backend, &wanted, &cancel, &TracingObserver).await.unwrap();
        assert_eq!(outcome.value().unwrap()[0].title, "Kept");
        assert!(matches!(outcome.issues(), [Issue::PersistFailed { .. }]));
        assert!(!backend.exists(Path::new("BLES01234-AA.ird")).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancellation_stops_downloads() {
        let catalog = MockCatalog::default().with_download("BLES01234-AA.ird", encode(&sample("BLES01234", "X")));
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = fetch_and_persist(&catalog, &backend, &filenames(&["BLES01234-AA.ird"]), &cancel, &TracingObserver)
            .await
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Cancelled);
        assert!(catalog.downloaded().is_empty());
    }
}
