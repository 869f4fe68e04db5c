//! Progress and diagnostics reporting for [`Resolver`](crate::Resolver).

use ird_catalog::IrdFilename;

use crate::outcome::Issue;

/// Something that happened while resolving a product code.
///
/// A [`resolve`](crate::Resolver::resolve) call reports, in order:
/// 1. [`Started`](Self::Started), once.
/// 2. [`CacheScanned`](Self::CacheScanned), once.
/// 3. [`CatalogSearched`](Self::CatalogSearched), once, unless the search
///    failed.
/// 4. [`Reconciled`](Self::Reconciled), once.
/// 5. [`Downloaded`](Self::Downloaded), once per file fetched.
/// 6. [`Finished`](Self::Finished), once.
///
/// [`Issue`](Self::Issue) events come after the stage that hit them. A
/// cancelled call stops reporting at the point of cancellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event<'a> {
    Started { product_code: &'a str },
    /// Usable records found in the cache.
    CacheScanned { cached: usize },
    /// Rows returned by the catalog, and how many carried a filename.
    CatalogSearched { rows: usize, filenames: usize },
    /// Files found on disk that the scan missed, and files left to download.
    Reconciled { recovered: usize, to_download: usize },
    Downloaded { filename: &'a IrdFilename, bytes: usize },
    Issue(&'a Issue),
    Finished { records: usize, issues: usize },
}

/// Receives [`Event`]s as they happen.
///
/// Any `Fn(Event<'_>)` closure is an observer.
pub trait Observer: Send + Sync {
    fn observe(&self, event: Event<'_>);
}

impl<F> Observer for F
where
    F: Fn(Event<'_>) + Send + Sync,
{
    fn observe(&self, event: Event<'_>) {
        self(event)
    }
}

/// Forwards events to `tracing`: failures as warnings (errors when a whole
/// source is unavailable), progress at debug level, and the final tally at
/// info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: Event<'_>) {
        match event {
            Event::Started { product_code } => tracing::debug!(product_code, "resolving IRD files"),
            Event::CacheScanned { cached } => tracing::debug!(cached, "scanned local IRD cache"),
            Event::CatalogSearched { rows, filenames } => {
                tracing::debug!(rows, filenames, "searched IRD Library")
            },
            Event::Reconciled { recovered, to_download } => {
                tracing::debug!(recovered, to_download, "reconciled catalog with cache")
            },
            Event::Downloaded { filename, bytes } => tracing::info!(%filename, bytes, "downloaded IRD file"),
            Event::Issue(issue @ (Issue::CacheUnavailable { .. } | Issue::CatalogUnavailable { .. })) => {
                tracing::error!("{issue}")
            },
            Event::Issue(issue) => tracing::warn!("{issue}"),
            Event::Finished { records, issues } => tracing::info!(records, issues, "resolved IRD files"),
        }
    }
}
