//! HTTP client for the IRD Library.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use exn::ResultExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, Url};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{IrdFilename, SearchResult};
use crate::Catalog;
use crate::query::{CacheBuster, search_parameters};

/// Public IRD Library instance.
pub const DEFAULT_BASE_URL: &str = "http://jonnysp.bplaced.net";
const SEARCH_ACCEPT: &str = "application/json, text/html;q=0.9";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// [`Catalog`] backed by the IRD Library website.
///
/// Responses are transparently decompressed (gzip, brotli). The client
/// makes a single attempt per call; whether to try again is the caller's
/// decision.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    /// Base URL without a trailing slash.
    base_url: String,
    cache_buster: Arc<CacheBuster>,
}

impl CatalogClient {
    /// Create a client for the catalog at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUrl`](ErrorKind::InvalidUrl) unless `base_url` is an
    /// absolute `http`/`https` URL, and [`Transport`](ErrorKind::Transport)
    /// if the HTTP client can't be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::Transport("could not initialise HTTP client".to_string()))?;
        Self::with_client(http, base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url).or_raise(|| ErrorKind::InvalidUrl(base_url.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            exn::bail!(ErrorKind::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_buster: Default::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Where the catalog serves the file itself.
    pub fn download_link(&self, filename: &IrdFilename) -> String {
        format!("{}/ird/{}", self.base_url, filename)
    }

    /// Where the catalog shows the file's details page.
    pub fn info_link(&self, filename: &IrdFilename) -> String {
        format!("{}/info.php?file=ird/{}", self.base_url, filename)
    }

    fn search_url(&self) -> String {
        format!("{}/data.php", self.base_url)
    }

    fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        Ok(response)
    }
}

fn transport(err: reqwest::Error) -> ErrorKind {
    ErrorKind::Transport(err.to_string())
}

#[async_trait]
impl Catalog for CatalogClient {
    #[instrument(skip(self), fields(base_url = %self.base_url, results))]
    async fn search(&self, query: &str) -> Result<SearchResult> {
        let parameters = search_parameters(query, self.cache_buster.next());
        let response = self
            .http
            .get(self.search_url())
            .query(&parameters)
            .header(ACCEPT, SEARCH_ACCEPT)
            .send()
            .await
            .map_err(transport)?;
        let body = Self::check_status(response)?.bytes().await.map_err(transport)?;
        let result = SearchResult::from_json(&body)?;
        tracing::Span::current().record("results", result.items.len());
        Ok(result)
    }

    #[instrument(skip(self, filename), fields(filename = %filename, bytes))]
    async fn download(&self, filename: &IrdFilename) -> Result<Vec<u8>> {
        let response = self.http.get(self.download_link(filename)).send().await.map_err(transport)?;
        let body = Self::check_status(response)?.bytes().await.map_err(transport)?;
        tracing::Span::current().record("bytes", body.len());
        Ok(body.to_vec())
    }
}
