use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use exn::ResultExt;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{CompatResult, UpdateInfo};
use crate::request::{DEFAULT_BASE_URL, RequestBuilder};
use crate::retry::{DEFAULT_MAX_ATTEMPTS, execute_with_retry};

/// Public update-check API.
pub const DEFAULT_UPDATE_URL: &str = "https://update.rpcs3.net/";
/// Commit reported to the update check when the caller has none.
pub const DEFAULT_COMMIT: &str = "somecommit";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client for the compatibility list and update-check APIs.
///
/// Every request goes through [`execute_with_retry`], so a call either
/// yields a response or fails with
/// [`CommunicationFailure`](ErrorKind::CommunicationFailure) or
/// [`Cancelled`](ErrorKind::Cancelled).
#[derive(Debug, Clone)]
pub struct CompatClient {
    http: Client,
    base_url: String,
    update_url: String,
    max_attempts: NonZeroU32,
}

impl CompatClient {
    /// Create a client against the public endpoints.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::Transport("could not initialise HTTP client".to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            update_url: DEFAULT_UPDATE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Use a different compatibility list endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a different update-check endpoint.
    pub fn with_update_url(mut self, update_url: impl Into<String>) -> Self {
        self.update_url = update_url.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Query the compatibility list.
    #[instrument(skip(self, cancel), fields(search = %request.search, results))]
    pub async fn compat_result(&self, request: &RequestBuilder, cancel: &CancellationToken) -> Result<CompatResult> {
        let started = Instant::now();
        let url = request.build(&self.base_url)?;
        let mut result: CompatResult =
            execute_with_retry(self.max_attempts, cancel, |_| self.get_json(url.clone())).await?;
        result.request = Some(request.clone());
        result.request_duration = started.elapsed();
        tracing::Span::current().record("results", result.results.len());
        Ok(result)
    }

    /// Ask whether a newer build than `commit` exists. Without a commit (or
    /// with an empty one) the server describes the latest build.
    #[instrument(skip(self, cancel))]
    pub async fn update(&self, commit: Option<&str>, cancel: &CancellationToken) -> Result<UpdateInfo> {
        let commit = commit.filter(|commit| !commit.is_empty()).unwrap_or(DEFAULT_COMMIT);
        let url = self.update_request(commit)?;
        execute_with_retry(self.max_attempts, cancel, |_| self.get_json(url.clone())).await
    }

    fn update_request(&self, commit: &str) -> Result<Url> {
        let mut url = Url::parse(&self.update_url).or_raise(|| ErrorKind::InvalidUrl(self.update_url.clone()))?;
        url.query_pairs_mut().append_pair("c", commit);
        Ok(url)
    }

    /// One attempt: a GET whose body is decoded as JSON only once the whole
    /// response has arrived with a successful status.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.http.get(url).send().await.map_err(|e| ErrorKind::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Transport(format!("unexpected HTTP status {status}")));
        }
        let body = response.bytes().await.map_err(|e| ErrorKind::Transport(e.to_string()))?;
        Ok(serde_json::from_slice(&body).map_err(|e| ErrorKind::Deserialize(e.to_string()))?)
    }
}
