//! Client code for shelfscan.
//!
//! This crate provides the fetch pipeline, the shared page cache, the
//! bounded dispatcher, per-retailer extraction and the price search that
//! ties them together.

pub mod aggregate;
pub mod dispatch;
pub mod extract;
pub mod fetch;
pub mod search;

#[cfg(test)]
mod test_support;

pub use aggregate::aggregate;
pub use dispatch::{DEFAULT_MAX_CONCURRENCY, Dispatcher, Fetched};
pub use extract::{Extraction, ExtractionRule, RuleSet, SourceKind, classify, extract, parse_price};
pub use fetch::{FetchCache, FetchClient, FetchConfig, PageBody, PageFetcher, PageResult};
pub use search::{PriceSearch, SearchReport, SourceReport};
