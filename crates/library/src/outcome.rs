//! Stage results that carry their own failures.

use derive_more::Display;
use ird_catalog::IrdFilename;

/// Result of a pipeline stage that absorbs failures instead of raising them.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The stage did everything it set out to do.
    Complete(T),
    /// The stage produced a value, but some of its work failed.
    Partial(T, Vec<Issue>),
    /// The stage produced nothing usable.
    Unavailable(Vec<Issue>),
}

impl<T> Outcome<T> {
    /// [`Complete`](Self::Complete) without issues, [`Partial`](Self::Partial) otherwise.
    pub fn from_parts(value: T, issues: Vec<Issue>) -> Self {
        if issues.is_empty() { Self::Complete(value) } else { Self::Partial(value, issues) }
    }

    pub fn unavailable(issue: Issue) -> Self {
        Self::Unavailable(vec![issue])
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Complete(value) | Self::Partial(value, _) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Complete(_) => &[],
            Self::Partial(_, issues) | Self::Unavailable(issues) => issues,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    pub fn into_parts(self) -> (Option<T>, Vec<Issue>) {
        match self {
            Self::Complete(value) => (Some(value), Vec::new()),
            Self::Partial(value, issues) => (Some(value), issues),
            Self::Unavailable(issues) => (None, issues),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Complete(value) => Outcome::Complete(f(value)),
            Self::Partial(value, issues) => Outcome::Partial(f(value), issues),
            Self::Unavailable(issues) => Outcome::Unavailable(issues),
        }
    }
}

/// A failure that was absorbed on the way to a result.
///
/// Reasons are rendered error messages; the pipeline never hands back the
/// underlying errors.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Issue {
    /// The cache directory couldn't be listed; it counts as empty.
    #[display("error accessing local IRD cache: {reason}")]
    CacheUnavailable { reason: String },
    /// A file in the cache couldn't be read or parsed; it counts as absent.
    #[display("error reading local IRD file {filename}: {reason}")]
    CorruptCacheEntry { filename: IrdFilename, reason: String },
    /// The catalog search failed; only cached records are available.
    #[display("IRD Library search failed: {reason}")]
    CatalogUnavailable { reason: String },
    /// A catalog row had no recognisable download link.
    #[display("couldn't parse IRD filename from {html}")]
    UnparsableFilename { html: String },
    /// A download failed; the file is skipped.
    #[display("failed to download {filename}: {reason}")]
    DownloadFailed { filename: IrdFilename, reason: String },
    /// A downloaded file isn't a valid IRD; it is skipped and not cached.
    #[display("downloaded {filename} is not a valid IRD file: {reason}")]
    CorruptDownload { filename: IrdFilename, reason: String },
    /// A downloaded file couldn't be written to the cache; its record is
    /// still returned.
    #[display("failed to cache {filename}: {reason}")]
    PersistFailed { filename: IrdFilename, reason: String },
}

impl Issue {
    /// The file the issue is about, if any.
    pub fn filename(&self) -> Option<&IrdFilename> {
        match self {
            Self::CorruptCacheEntry { filename, .. }
            | Self::DownloadFailed { filename, .. }
            | Self::CorruptDownload { filename, .. }
            | Self::PersistFailed { filename, .. } => Some(filename),
            Self::CacheUnavailable { .. } | Self::CatalogUnavailable { .. } | Self::UnparsableFilename { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        assert_eq!(Outcome::from_parts(1, vec![]), Outcome::Complete(1));
        let issue = Issue::CatalogUnavailable { reason: "timeout".to_string() };
        let outcome = Outcome::from_parts(1, vec![issue.clone()]);
        assert_eq!(outcome.value(), Some(&1));
        assert_eq!(outcome.issues(), &[issue]);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_unavailable() {
        let outcome: Outcome<u8> = Outcome::unavailable(Issue::CacheUnavailable { reason: "gone".to_string() });
        assert_eq!(outcome.value(), None);
        let (value, issues) = outcome.map(|v| v * 2).into_parts();
        assert_eq!(value, None);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_issue_display() {
        let issue = Issue::DownloadFailed {
            filename: IrdFilename::new("BLES01234-AB.ird"),
            reason: "unexpected HTTP status 404".to_string(),
        };
        assert_eq!(issue.to_string(), "failed to download BLES01234-AB.ird: unexpected HTTP status 404");
        assert_eq!(issue.filename().map(IrdFilename::as_str), Some("BLES01234-AB.ird"));
    }
}
