use derive_more::Display;
use reqwest::Url;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;

/// Public compatibility list API.
pub const DEFAULT_BASE_URL: &str = "https://rpcs3.net/compatibility";

/// Page sizes the compatibility API accepts.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq)]
pub enum Amount {
    #[default]
    #[display("25")]
    TwentyFive,
    #[display("50")]
    Fifty,
    #[display("100")]
    OneHundred,
    #[display("200")]
    TwoHundred,
}

impl Amount {
    /// The smallest accepted page size that holds `count` results, capped at 200.
    pub fn at_least(count: u32) -> Self {
        match count {
            0..=25 => Self::TwentyFive,
            26..=50 => Self::Fifty,
            51..=100 => Self::OneHundred,
            _ => Self::TwoHundred,
        }
    }
}

/// Query for the compatibility list.
///
/// # Examples
///
/// ```rust
/// use ird_compat::{Amount, RequestBuilder};
///
/// let request = RequestBuilder::new("Demon's Souls").with_amount(Amount::Fifty);
/// let url = request.build("https://rpcs3.net/compatibility").unwrap();
/// assert_eq!(url.as_str(), "https://rpcs3.net/compatibility?g=Demon%27s+Souls&r=50&api=v1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBuilder {
    pub search: String,
    pub amount: Amount,
}

impl RequestBuilder {
    pub fn new(search: impl Into<String>) -> Self {
        Self { search: search.into(), amount: Amount::default() }
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    /// The request URL against `base_url`.
    pub fn build(&self, base_url: &str) -> Result<Url> {
        let mut url = Url::parse(base_url).or_raise(|| ErrorKind::InvalidUrl(base_url.to_string()))?;
        url.query_pairs_mut()
            .append_pair("g", &self.search)
            .append_pair("r", &self.amount.to_string())
            .append_pair("api", "v1");
        Ok(url)
    }
}
