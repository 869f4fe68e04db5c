use ird_catalog::{Catalog, SearchResult};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::cancel::cancellable;
use crate::error::Result;
use crate::outcome::{Issue, Outcome};

/// Searches the catalog for a product code.
///
/// A failed search is [`Unavailable`](Outcome::Unavailable). Rows whose
/// filename cell has content but no recognisable download link are kept in
/// the result and reported. Only cancellation is an error.
#[instrument(skip(catalog, cancel))]
pub async fn search_catalog(
    catalog: &dyn Catalog,
    product_code: &str,
    cancel: &CancellationToken,
) -> Result<Outcome<SearchResult>> {
    let result = match cancellable(cancel, catalog.search(product_code)).await? {
        Ok(result) => result,
        Err(err) => return Ok(Outcome::unavailable(Issue::CatalogUnavailable { reason: err.to_string() })),
    };
    let issues = result
        .items
        .iter()
        .filter(|item| item.filename.is_none() && !item.filename_html.is_empty())
        .map(|item| Issue::UnparsableFilename { html: item.filename_html.clone() })
        .collect();
    Ok(Outcome::from_parts(result, issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ird_catalog::mock::MockCatalog;

    #[tokio::test]
    async fn test_unparsable_rows_are_reported() {
        let catalog = MockCatalog::default()
            .with_ird("BLES01234-AA.ird", "<span>EU</span> Game", vec![])
            .with_row("Broken", "<a href=\"elsewhere\">x</a>")
            .with_row("Empty", "");
        let cancel = CancellationToken::new();
        let outcome = search_catalog(&catalog, "BLES01234", &cancel).await.unwrap();
        assert_eq!(outcome.value().unwrap().items.len(), 3);
        assert_eq!(outcome.issues(), &[Issue::UnparsableFilename { html: "<a href=\"elsewhere\">x</a>".to_string() }]);
    }

    #[tokio::test]
    async fn test_failed_search_is_unavailable() {
        let cancel = CancellationToken::new();
        let outcome = search_catalog(&MockCatalog::unavailable(), "BLES01234", &cancel).await.unwrap();
        assert!(matches!(
            outcome,
            Outcome::Unavailable(ref issues) if matches!(issues[..], [Issue::CatalogUnavailable { .. }])
        ));
    }

    #[tokio::test]
    async fn test_cancelled_search() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = search_catalog(&MockCatalog::default(), "BLES01234", &cancel).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Cancelled);
    }
}
