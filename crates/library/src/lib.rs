//! IRD resolution pipeline.
//!
//! [`Resolver::resolve`] gathers every IRD file for a product code: it
//! scans the local cache, searches the catalog, works out what's missing,
//! and downloads it into the cache. Each stage is also usable on its own
//! and reports its result as an [`Outcome`].

mod cancel;
pub mod error;
mod fetch;
mod observer;
mod outcome;
mod reconcile;
mod resolve;
mod scan;
mod search;

pub use crate::fetch::fetch_and_persist;
pub use crate::observer::{Event, Observer, TracingObserver};
pub use crate::outcome::{Issue, Outcome};
pub use crate::reconcile::{Reconciliation, reconcile};
pub use crate::resolve::{Resolution, Resolver};
pub use crate::scan::{CacheScan, scan_cache};
pub use crate::search::search_catalog;
