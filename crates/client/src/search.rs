//! Price search orchestrator.
//!
//! For every supported source with registered URLs, fetches its pages
//! through the [`Dispatcher`], extracts at most one product per page, and
//! merges everything into one price-sorted list once all sources finished.
//!
//! Sources run concurrently; `join_all` keeps their results in registration
//! order so the aggregate is deterministic.

use std::sync::Arc;
use std::time::Instant;

use shelfscan_core::{AppConfig, Error, FetchError, ProductRecord, Query, UrlRegistry};

use crate::aggregate::aggregate;
use crate::dispatch::Dispatcher;
use crate::extract::{Extraction, ExtractionRule, RuleSet, SourceKind, classify};
use crate::fetch::{FetchCache, FetchClient, FetchConfig};

/// Per-source diagnostics for one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceReport {
    /// Registry identifier, e.g. "carrefour".
    pub source: String,
    /// Pages fetched successfully.
    pub pages: usize,
    /// Pages that produced a matching record.
    pub matched: usize,
    /// Pages whose product name did not contain the query.
    pub filtered: usize,
    /// Pages missing at least one field.
    pub misses: usize,
    /// URLs whose fetch failed.
    pub failures: Vec<FetchError>,
}

/// Result of a search: sorted products plus what happened per source.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub products: Vec<ProductRecord>,
    pub sources: Vec<SourceReport>,
}

impl SearchReport {
    pub fn failures(&self) -> impl Iterator<Item = &FetchError> {
        self.sources.iter().flat_map(|s| s.failures.iter())
    }
}

/// Answers product queries over the registered retailer pages.
pub struct PriceSearch {
    registry: Arc<UrlRegistry>,
    rules: Arc<RuleSet>,
    dispatcher: Dispatcher,
}

impl PriceSearch {
    pub fn new(registry: UrlRegistry, rules: RuleSet, dispatcher: Dispatcher) -> Self {
        for source in registry.source_names() {
            if SourceKind::from_id(source).is_none() {
                tracing::warn!(source, "registry source has no extraction rule; ignoring");
            }
        }

        Self { registry: Arc::new(registry), rules: Arc::new(rules), dispatcher }
    }

    /// Wire the production pipeline: reqwest client, shared cache, built-in rules.
    pub fn from_config(config: &AppConfig, registry: UrlRegistry) -> Result<Self, Error> {
        let client = FetchClient::new(FetchConfig::from(config))?;
        let cache = Arc::new(FetchCache::new(Arc::new(client)));
        let dispatcher = Dispatcher::new(cache, config.max_concurrency);

        Ok(Self::new(registry, RuleSet::builtin()?, dispatcher))
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        self.dispatcher.cache()
    }

    /// Search every source for products whose name contains `query`.
    ///
    /// Never fails: fetch failures are recorded in the report and the
    /// remaining pages still contribute.
    pub async fn search(&self, query: &Query) -> SearchReport {
        let start = Instant::now();

        let batches = self.rules.iter().map(|rule| self.search_source(rule, query));
        let outcomes = futures::future::join_all(batches).await;

        let (per_source, sources): (Vec<_>, Vec<_>) = outcomes.into_iter().unzip();
        let products = aggregate(per_source);

        tracing::info!(
            %query,
            products = products.len(),
            failures = sources.iter().map(|s: &SourceReport| s.failures.len()).sum::<usize>(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search completed"
        );

        SearchReport { products, sources }
    }

    async fn search_source(&self, rule: &ExtractionRule, query: &Query) -> (Vec<ProductRecord>, SourceReport) {
        let urls = self.registry.urls(&rule.source);
        let mut fetched = self.dispatcher.fetch_all(urls).await;
        fetched.sort_by_key(|f| f.index);

        let mut report = SourceReport { source: rule.source.clone(), ..Default::default() };
        let mut products = Vec::new();

        for item in fetched {
            let page = match item.result {
                Ok(page) => page,
                Err(err) => {
                    report.failures.push(err);
                    continue;
                }
            };
            report.pages += 1;

            match classify(rule, &item.url, &page.html, query) {
                Extraction::Matched(record) => {
                    report.matched += 1;
                    products.push(record);
                }
                Extraction::Filtered => report.filtered += 1,
                Extraction::Miss => report.misses += 1,
            }
        }

        tracing::debug!(
            source = %rule.source,
            pages = report.pages,
            matched = report.matched,
            misses = report.misses,
            failures = report.failures.len(),
            "source searched"
        );

        (products, report)
    }
}
