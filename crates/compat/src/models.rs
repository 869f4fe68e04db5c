use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::request::RequestBuilder;

/// Response of the compatibility list API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CompatResult {
    /// `0` results, `1` no results, `2` fuzzy results, negative on server
    /// errors.
    pub return_code: i32,
    pub search_term: Option<String>,
    /// Results keyed by product code.
    pub results: BTreeMap<String, TitleInfo>,
    /// The request that produced this response.
    #[serde(skip)]
    pub request: Option<RequestBuilder>,
    /// Time from the first attempt to a usable response.
    #[serde(skip)]
    pub request_duration: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TitleInfo {
    pub title: Option<String>,
    pub alternative_title: Option<String>,
    pub wiki_title: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub thread: Option<u64>,
    pub commit: Option<String>,
    pub pr: Option<u64>,
    pub network: Option<u8>,
}

/// Response of the update-check API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct UpdateInfo {
    /// `0` up to date, `1` update available, negative on errors.
    pub return_code: i32,
    pub latest_build: Option<BuildInfo>,
    pub current_build: Option<BuildInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BuildInfo {
    pub pr: Option<u64>,
    pub datetime: Option<String>,
    pub version: Option<String>,
    pub windows: Option<BuildLink>,
    pub linux: Option<BuildLink>,
    pub mac: Option<BuildLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BuildLink {
    pub download: Option<String>,
    pub size: Option<u64>,
    pub checksum: Option<String>,
}
