//! Work out which catalog files still need fetching.

use std::collections::HashSet;

use ird_catalog::{IrdFilename, SearchResult};
use ird_format::Ird;
use ird_storage::BackendHandle;
use tracing::instrument;

use crate::outcome::{Issue, Outcome};
use crate::scan::read_record;

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Records of catalog files that were on disk after all.
    pub already_present: Vec<Ird>,
    /// Catalog files to download, in catalog order.
    pub to_download: Vec<IrdFilename>,
}

/// Compares catalog filenames against the cached ones, ignoring case.
///
/// Every catalog file that isn't cached is looked up on disk once more
/// under its exact name, which picks up files the scan missed (written by
/// another process in the meantime, or named outside the product prefix).
/// Those that parse become [`already_present`](Reconciliation::already_present);
/// the rest are left to download. Without catalog data there is nothing to
/// do.
#[instrument(skip_all, fields(backend = backend.name()))]
pub async fn reconcile(
    backend: &BackendHandle,
    cached: &HashSet<IrdFilename>,
    catalog: Option<&SearchResult>,
) -> Outcome<Reconciliation> {
    let mut reconciliation = Reconciliation::default();
    let Some(catalog) = catalog else {
        return Outcome::Complete(reconciliation);
    };
    let mut seen = HashSet::new();
    let candidates: Vec<&IrdFilename> =
        catalog.filenames().filter(|filename| !cached.contains(*filename) && seen.insert(*filename)).collect();
    let mut issues = Vec::new();
    for candidate in candidates {
        match backend.exists(candidate.as_path()).await {
            Ok(true) => match read_record(backend, candidate).await {
                Ok(record) => {
                    reconciliation.already_present.push(record);
                    continue;
                },
                Err(reason) => issues.push(Issue::CorruptCacheEntry { filename: candidate.clone(), reason }),
            },
            Ok(false) => {},
            // Can't tell; downloading again is harmless.
            Err(err) => tracing::debug!(filename = %candidate, error = %err, "could not check cache for file"),
        }
        reconciliation.to_download.push(candidate.clone());
    }
    Outcome::from_parts(reconciliation, issues)
}
