use std::sync::Arc;

use ird_catalog::CatalogHandle;
use ird_format::Ird;
use ird_storage::BackendHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::cancel::cancellable;
use crate::error::Result;
use crate::fetch::fetch_and_persist;
use crate::observer::{Event, Observer, TracingObserver};
use crate::outcome::{Issue, Outcome};
use crate::reconcile::reconcile;
use crate::scan::{CacheScan, scan_cache};
use crate::search::search_catalog;

/// Everything known about a product code's IRD files.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Cached records first, then ones recovered from disk, then downloads.
    /// No file appears twice.
    pub records: Vec<Ird>,
    /// Every failure absorbed along the way, in the order it happened.
    pub issues: Vec<Issue>,
    pub cached: usize,
    pub recovered: usize,
    pub downloaded: usize,
}

impl Resolution {
    fn absorb<T>(&mut self, observer: &dyn Observer, outcome: Outcome<T>) -> Option<T> {
        let (value, issues) = outcome.into_parts();
        for issue in issues {
            observer.observe(Event::Issue(&issue));
            self.issues.push(issue);
        }
        value
    }
}

/// Finds every IRD file for a product code, from the cache and the catalog.
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ird_catalog::CatalogClient;
/// use ird_library::Resolver;
/// use ird_storage::backend::LocalBackend;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = CatalogClient::new(ird_catalog::DEFAULT_BASE_URL, Duration::from_secs(30))?;
/// let backend = LocalBackend::new("cache", "/var/cache/ird")?;
/// let resolver = Resolver::new(Arc::new(catalog), Arc::new(backend));
/// let resolution = resolver.resolve("BLES01234", &CancellationToken::new()).await?;
/// for record in &resolution.records {
///     println!("{} {}", record.product_code, record.title);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Resolver {
    catalog: CatalogHandle,
    backend: BackendHandle,
    observer: Arc<dyn Observer>,
}

impl Resolver {
    /// Reports to [`TracingObserver`] unless told otherwise.
    pub fn new(catalog: CatalogHandle, backend: BackendHandle) -> Self {
        Self { catalog, backend, observer: Arc::new(TracingObserver) }
    }

    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Scans the cache, searches the catalog, and downloads whatever the
    /// cache is missing.
    ///
    /// Every stage degrades on its own: an unreadable cache counts as empty,
    /// a failed search leaves just the cached records, and files that fail
    /// to download or parse are left out. All of it ends up in
    /// [`Resolution::issues`].
    ///
    /// # Errors
    ///
    /// Only [`Cancelled`](crate::error::ErrorKind::Cancelled), once `cancel`
    /// fires. Files downloaded before then stay cached.
    #[instrument(skip(self, cancel), fields(backend = self.backend.name(), records))]
    pub async fn resolve(&self, product_code: &str, cancel: &CancellationToken) -> Result<Resolution> {
        let observer = self.observer.as_ref();
        observer.observe(Event::Started { product_code });
        let mut resolution = Resolution::default();

        let scan = cancellable(cancel, scan_cache(&self.backend, product_code)).await?;
        let CacheScan { filenames: cached, records } = resolution.absorb(observer, scan).unwrap_or_default();
        observer.observe(Event::CacheScanned { cached: records.len() });
        resolution.cached = records.len();
        resolution.records = records;

        let search = search_catalog(self.catalog.as_ref(), product_code, cancel).await?;
        if let Some(result) = search.value() {
            let rows = result.items.len();
            observer.observe(Event::CatalogSearched { rows, filenames: result.filenames().count() });
        }
        let search = resolution.absorb(observer, search);

        let reconciliation = cancellable(cancel, reconcile(&self.backend, &cached, search.as_ref())).await?;
        let reconciliation = resolution.absorb(observer, reconciliation).unwrap_or_default();
        let recovered = reconciliation.already_present.len();
        observer.observe(Event::Reconciled { recovered, to_download: reconciliation.to_download.len() });
        resolution.recovered = recovered;
        resolution.records.extend(reconciliation.already_present);

        if !reconciliation.to_download.is_empty() {
            let fetched = fetch_and_persist(
                self.catalog.as_ref(),
                &self.backend,
                &reconciliation.to_download,
                cancel,
                observer,
            )
            .await?;
            let downloaded = resolution.absorb(observer, fetched).unwrap_or_default();
            resolution.downloaded = downloaded.len();
            resolution.records.extend(downloaded);
        }

        tracing::Span::current().record("records", resolution.records.len());
        observer.observe(Event::Finished { records: resolution.records.len(), issues: resolution.issues.len() });
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ird_catalog::mock::MockCatalog;
    use ird_format::mock::{encode, sample};
    use ird_storage::StorageBackend;
    use ird_storage::backend::{LocalBackend, MockBackend};
    use std::collections::BTreeSet;
    use std::path::Path;
    use std::sync::Mutex;

    fn record(title: &str) -> Vec<u8> {
        encode(&sample("BLES01234", title))
    }

    fn titles(resolution: &Resolution) -> Vec<&str> {
        resolution.records.iter().map(|record| record.title.as_str()).collect()
    }

    fn resolver(catalog: &Arc<MockCatalog>, backend: &Arc<MockBackend>) -> Resolver {
        Resolver::new(catalog.clone(), backend.clone())
    }

    #[tokio::test]
    async fn test_resolving_twice_downloads_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(
            MockCatalog::default()
                .with_ird("BLES01234-AA.ird", "One", record("One"))
                .with_ird("BLES01234-BB.ird", "Two", record("Two")),
        );
        let backend = Arc::new(LocalBackend::new("local", temp_dir.path()).unwrap());
        let resolver = Resolver::new(catalog.clone(), backend);
        let cancel = CancellationToken::new();

        let first = resolver.resolve("BLES01234", &cancel).await.unwrap();
        assert_eq!(first.downloaded, 2);
        let second = resolver.resolve("BLES01234", &cancel).await.unwrap();
        assert_eq!(second.cached, 2);
        assert_eq!(second.downloaded, 0);
        assert_eq!(catalog.downloaded().len(), 2);
        let set = |resolution: &Resolution| titles(resolution).into_iter().map(str::to_string).collect::<BTreeSet<_>>();
        assert_eq!(set(&first), set(&second));
    }

    #[tokio::test]
    async fn test_cached_file_in_other_case_is_not_downloaded() {
        let catalog = Arc::new(MockCatalog::default().with_ird("ABCD12345-FF.ird", "Upper", record("Upper")));
        let backend = Arc::new(MockBackend::with_files([("abcd12345-ff.ird", encode(&sample("ABCD12345", "Lower")))]));
        let resolution = resolver(&catalog, &backend).resolve("ABCD12345", &CancellationToken::new()).await.unwrap();
        assert_eq!(titles(&resolution), vec!["Lower"]);
        assert!(catalog.downloaded().is_empty());
        assert!(resolution.issues.is_empty());
    }

    #[tokio::test]
    async fn test_failed_search_returns_cached_records() {
        let catalog = Arc::new(MockCatalog::unavailable());
        let backend = Arc::new(MockBackend::with_files([
            ("BLES01234-AA.ird", record("One")),
            ("BLES01234-BB.ird", record("Two")),
        ]));
        let resolution = resolver(&catalog, &backend).resolve("BLES01234", &CancellationToken::new()).await.unwrap();
        assert_eq!(titles(&resolution), vec!["One", "Two"]);
        assert!(catalog.downloaded().is_empty());
        assert!(matches!(resolution.issues[..], [Issue::CatalogUnavailable { .. }]));
    }

    #[tokio::test]
    async fn test_one_good_download_out_of_three() {
        let catalog = Arc::new(
            MockCatalog::default()
                .with_ird("BLES01234-AA.ird", "Good", record("Good"))
                .with_row("Missing", "<a href=\"ird/BLES01234-BB.ird\">")
                .with_ird("BLES01234-CC.ird", "Corrupt", b"corrupt".to_vec()),
        );
        let backend = Arc::new(MockBackend::default());
        let resolution = resolver(&catalog, &backend).resolve("BLES01234", &CancellationToken::new()).await.unwrap();
        assert_eq!(titles(&resolution), vec!["Good"]);
        assert_eq!(resolution.issues.len(), 2);
        assert_eq!(catalog.downloaded().len(), 3);
    }

    #[tokio::test]
    async fn test_records_keep_cached_recovered_downloaded_order() {
        let catalog = Arc::new(
            MockCatalog::default()
                .with_ird("BLES01234-AA.ird", "Cached", record("Cached"))
                .with_ird("BLES01234-EE.ird", "Downloaded", record("Downloaded"))
                .with_ird("BLUS30443-00.ird", "Recovered", record("Recovered")),
        );
        // `BLUS30443-00.ird` doesn't match the product prefix, so only the
        // exact-name lookup finds it.
        let backend = Arc::new(MockBackend::with_files([
            ("BLES01234-AA.ird", record("Cached")),
            ("BLUS30443-00.ird", record("Recovered")),
        ]));
        let resolution = resolver(&catalog, &backend).resolve("BLES01234", &CancellationToken::new()).await.unwrap();
        assert_eq!(titles(&resolution), vec!["Cached", "Recovered", "Downloaded"]);
        assert_eq!((resolution.cached, resolution.recovered, resolution.downloaded), (1, 1, 1));
        assert_eq!(backend.contents("BLES01234-EE.ird").await, Some(record("Downloaded")));
    }

    #[tokio::test]
    async fn test_unwritable_cache_still_returns_downloads() {
        let catalog = Arc::new(MockCatalog::default().with_ird("BLES01234-AA.ird", "One", record("One")));
        let backend = Arc::new(MockBackend::default().with_failing_list().with_failing_writes());
        let resolution = resolver(&catalog, &backend).resolve("BLES01234", &CancellationToken::new()).await.unwrap();
        assert_eq!(titles(&resolution), vec!["One"]);
        assert!(matches!(
            resolution.issues[..],
            [Issue::CacheUnavailable { .. }, Issue::PersistFailed { .. }]
        ));
        assert!(!backend.exists(Path::new("BLES01234-AA.ird")).await.unwrap());
    }

    #[tokio::test]
    async fn test_observer_sees_every_stage() {
        let catalog = Arc::new(
            MockCatalog::default()
                .with_ird("BLES01234-AA.ird", "One", record("One"))
                .with_row("Broken", "<a>nothing here</a>"),
        );
        let backend = Arc::new(MockBackend::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let resolver = resolver(&catalog, &backend).with_observer(move |event: Event<'_>| {
            let name = match event {
                Event::Started { .. } => "started",
                Event::CacheScanned { .. } => "scanned",
                Event::CatalogSearched { .. } => "searched",
                Event::Reconciled { .. } => "reconciled",
                Event::Downloaded { .. } => "downloaded",
                Event::Issue(_) => "issue",
                Event::Finished { .. } => "finished",
            };
            recorder.lock().unwrap().push(name);
        });
        resolver.resolve("BLES01234", &CancellationToken::new()).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["started", "scanned", "searched", "issue", "reconciled", "downloaded", "finished"]
        );
    }

    #[tokio::test]
    async fn test_cancelled_resolution() {
        let catalog = Arc::new(MockCatalog::default().with_ird("BLES01234-AA.ird", "One", record("One")));
        let backend = Arc::new(MockBackend::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = resolver(&catalog, &backend).resolve("BLES01234", &cancel).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Cancelled);
        assert_eq!(catalog.search_count(), 0);
        assert_eq!(backend.write_count(), 0);
    }
}
