use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::Deserialize;

use crate::consts::IRD_EXTENSION;
use crate::error::{ErrorKind, Result};
use crate::extract;

/// Name of an IRD file, as published by the catalog and stored in the cache.
///
/// Comparison and hashing ignore ASCII case: `BLES01234-AB.ird` and
/// `bles01234-ab.IRD` name the same file. The original spelling is kept for
/// display and for the on-disk name.
#[derive(Debug, Clone)]
pub struct IrdFilename(String);

impl IrdFilename {
    /// Wraps a name without checking it, e.g. one found in the cache.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Whether this file is an IRD for the given product: the name starts
    /// with the product code and ends in `.ird`, both ignoring case.
    ///
    /// ```rust
    /// use ird_catalog::IrdFilename;
    /// let filename = IrdFilename::new("bles01234-FF00.IRD");
    /// assert!(filename.belongs_to("BLES01234"));
    /// assert!(!filename.belongs_to("BLUS30443"));
    /// ```
    pub fn belongs_to(&self, product_code: &str) -> bool {
        let name = self.0.as_bytes();
        name.len() >= product_code.len() + IRD_EXTENSION.len()
            && name[..product_code.len()].eq_ignore_ascii_case(product_code.as_bytes())
            && name[name.len() - IRD_EXTENSION.len()..].eq_ignore_ascii_case(IRD_EXTENSION.as_bytes())
    }
}

impl PartialEq for IrdFilename {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}
impl Eq for IrdFilename {}

impl Hash for IrdFilename {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for IrdFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IrdFilename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One row of a catalog search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultItem {
    /// Catalog row identifier, when the server sent one.
    pub id: Option<String>,
    /// Raw HTML of the title cell.
    pub title_html: String,
    /// Raw HTML of the filename cell.
    pub filename_html: String,
    /// Title extracted from `title_html`.
    pub title: Option<String>,
    /// Filename extracted from `filename_html`; `None` when the cell holds
    /// no recognisable download link.
    pub filename: Option<IrdFilename>,
}

impl SearchResultItem {
    /// Builds a row from its raw cells, extracting title and filename.
    pub fn from_html(id: Option<String>, title_html: impl Into<String>, filename_html: impl Into<String>) -> Self {
        let title_html = title_html.into();
        let filename_html = filename_html.into();
        Self {
            id,
            title: extract::title(&title_html),
            filename: extract::filename(&filename_html),
            title_html,
            filename_html,
        }
    }
}

/// A decoded catalog search response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    /// Rows in the order the catalog returned them.
    pub items: Vec<SearchResultItem>,
    pub records_total: Option<u64>,
    pub records_filtered: Option<u64>,
}

impl SearchResult {
    /// Decodes the JSON body of a search response.
    ///
    /// The body is decoded regardless of the `Content-Type` the server
    /// claimed. A missing `data` array means no rows. The record counts are
    /// informational: numbers and numeric strings are both read, anything
    /// else becomes `None`.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let raw: RawSearchResult = serde_json::from_slice(body)
            .map_err(|err| ErrorKind::Deserialize(format!("{err} ({} byte body)", body.len())))?;
        let items = raw
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|item| {
                let id = item.id.and_then(|id| match id {
                    serde_json::Value::String(id) => Some(id),
                    serde_json::Value::Number(id) => Some(id.to_string()),
                    _ => None,
                });
                SearchResultItem::from_html(id, item.title.unwrap_or_default(), item.filename.unwrap_or_default())
            })
            .collect();
        Ok(Self {
            items,
            records_total: raw.records_total.as_ref().and_then(count),
            records_filtered: raw.records_filtered.as_ref().and_then(count),
        })
    }

    /// Filenames of every row that has one, in catalog order.
    pub fn filenames(&self) -> impl Iterator<Item = &IrdFilename> {
        self.items.iter().filter_map(|item| item.filename.as_ref())
    }
}

fn count(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(count) => count.as_u64(),
        serde_json::Value::String(count) => count.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSearchResult {
    #[serde(alias = "recordsTotal")]
    records_total: Option<serde_json::Value>,
    #[serde(alias = "recordsFiltered")]
    records_filtered: Option<serde_json::Value>,
    data: Option<Vec<RawSearchResultItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSearchResultItem {
    id: Option<serde_json::Value>,
    #[serde(alias = "title_html")]
    title: Option<String>,
    #[serde(alias = "filename_html")]
    filename: Option<String>,
}
