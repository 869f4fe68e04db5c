//! Clients for the RPCS3 compatibility list and update-check APIs.
//!
//! Unlike the IRD catalog, these APIs are retried: see [`retry`].

mod client;
pub mod error;
mod models;
mod request;
pub mod retry;

pub use crate::client::{CompatClient, DEFAULT_COMMIT, DEFAULT_UPDATE_URL};
pub use crate::models::{BuildInfo, BuildLink, CompatResult, TitleInfo, UpdateInfo};
pub use crate::request::{Amount, DEFAULT_BASE_URL, RequestBuilder};
