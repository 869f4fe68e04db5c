//! Cached records for a product code.

use std::collections::HashSet;

use ird_catalog::IrdFilename;
use ird_format::Ird;
use ird_storage::BackendHandle;
use tracing::instrument;

use crate::outcome::{Issue, Outcome};

/// Usable IRD files found in the cache.
#[derive(Debug, Clone, Default)]
pub struct CacheScan {
    /// Names of every file in `records`.
    pub filenames: HashSet<IrdFilename>,
    /// Parsed records in listing order.
    pub records: Vec<Ird>,
}

/// Scans the cache for files named `<product_code>*.ird`, ignoring case, and
/// parses each one.
///
/// Files that can't be read or parsed are left out of both the records and
/// the filenames, so they get fetched again. A cache that can't be listed
/// is [`Unavailable`](Outcome::Unavailable) and counts as empty. When the
/// cache holds the same name in different cases, the first listed wins.
#[instrument(skip(backend), fields(backend = backend.name()))]
pub async fn scan_cache(backend: &BackendHandle, product_code: &str) -> Outcome<CacheScan> {
    let files = match backend.list().await {
        Ok(files) => files,
        Err(err) => return Outcome::unavailable(Issue::CacheUnavailable { reason: err.to_string() }),
    };
    let mut scan = CacheScan::default();
    let mut issues = Vec::new();
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let filename = IrdFilename::new(name);
        if !filename.belongs_to(product_code) || scan.filenames.contains(&filename) {
            continue;
        }
        match read_record(backend, &filename).await {
            Ok(record) => {
                scan.filenames.insert(filename);
                scan.records.push(record);
            },
            Err(reason) => issues.push(Issue::CorruptCacheEntry { filename, reason }),
        }
    }
    Outcome::from_parts(scan, issues)
}

/// Read and parse one cached file, flattening either failure to its message.
pub(crate) async fn read_record(backend: &BackendHandle, filename: &IrdFilename) -> Result<Ird, String> {
    let bytes = backend.read(filename.as_path()).await.map_err(|err| err.to_string())?;
    ird_format::parse(&bytes).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ird_format::mock::{encode, sample};
    use ird_storage::backend::{LocalBackend, MockBackend};
    use std::sync::Arc;

    fn titles(scan: &CacheScan) -> Vec<&str> {
        scan.records.iter().map(|record| record.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_scan_matches_prefix_and_extension_ignoring_case() {
        let backend: BackendHandle = Arc::new(MockBackend::with_files([
            ("BLES01234-AA.ird", encode(&sample("BLES01234", "One"))),
            ("bles01234-bb.IRD", encode(&sample("BLES01234", "Two"))),
            ("BLES01234-CC.txt", encode(&sample("BLES01234", "Not an IRD name"))),
            ("BLUS30443-DD.ird", encode(&sample("BLUS30443", "Other product"))),
        ]));
        let outcome = scan_cache(&backend, "BLES01234").await;
        assert!(outcome.is_complete());
        let scan = outcome.value().unwrap();
        assert_eq!(titles(scan), vec!["One", "Two"]);
        assert!(scan.filenames.contains(&IrdFilename::new("BLES01234-BB.ird")));
        assert_eq!(scan.filenames.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_files_are_reported_and_excluded() {
        let backend: BackendHandle = Arc::new(MockBackend::with_files([
            ("BLES01234-AA.ird", encode(&sample("BLES01234", "Good"))),
            ("BLES01234-BB.ird", vec![0u8; 300]),
        ]));
        let outcome = scan_cache(&backend, "BLES01234").await;
        let issues = outcome.issues().to_vec();
        let scan = outcome.value().unwrap();
        assert_eq!(titles(scan), vec!["Good"]);
        assert!(!scan.filenames.contains(&IrdFilename::new("BLES01234-BB.ird")));
        assert!(matches!(
            issues.as_slice(),
            [Issue::CorruptCacheEntry { filename, .. }] if filename.as_str() == "BLES01234-BB.ird"
        ));
    }

    #[tokio::test]
    async fn test_unlistable_cache_is_unavailable() {
        let backend: BackendHandle = Arc::new(MockBackend::default().with_failing_list());
        let outcome = scan_cache(&backend, "BLES01234").await;
        assert!(matches!(
            outcome,
            Outcome::Unavailable(ref issues) if matches!(issues[..], [Issue::CacheUnavailable { .. }])
        ));
    }

    #[tokio::test]
    async fn test_missing_cache_directory_is_unavailable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend: BackendHandle = Arc::new(LocalBackend::new("local", temp_dir.path().join("missing")).unwrap());
        let outcome = scan_cache(&backend, "BLES01234").await;
        assert!(outcome.value().is_none());
    }

    #[tokio::test]
    async fn test_gzipped_files_on_disk() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let temp_dir = tempfile::tempdir().unwrap();
        let mut record = sample("BLES01234", "Compressed");
        // Incompressible padding keeps the gzip stream above the minimum size.
        record.header = (0..512u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encode(&record)).unwrap();
        std::fs::write(temp_dir.path().join("BLES01234-AA.ird"), encoder.finish().unwrap()).unwrap();

        let backend: BackendHandle = Arc::new(LocalBackend::new("local", temp_dir.path()).unwrap());
        let outcome = scan_cache(&backend, "BLES01234").await;
        assert_eq!(titles(outcome.value().unwrap()), vec!["Compressed"]);
    }
}
