//! Process-lifetime page cache with single-flight misses.
//!
//! Each URL owns a `OnceCell` in a mutex-guarded table. The table lock is
//! held only to find or insert the cell; the fetch itself runs inside
//! `OnceCell::get_or_init`, so concurrent callers for the same URL wait on
//! one request instead of issuing their own. If the initializing caller is
//! cancelled the cell stays empty and the next waiter fetches.
//!
//! Entries never expire. A page that changes upstream after its first fetch
//! keeps serving the first outcome until the process restarts.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use shelfscan_core::FetchError;
use tokio::sync::{Mutex, OnceCell};

use super::{PageBody, PageFetcher};

/// Outcome of fetching a URL, shared between every caller that asked for it.
pub type PageResult = Result<Arc<PageBody>, FetchError>;

/// Memoizes fetch outcomes, successes and failures alike, keyed by URL.
pub struct FetchCache {
    fetcher: Arc<dyn PageFetcher>,
    entries: Mutex<HashMap<String, Arc<OnceCell<PageResult>>>>,
    fetches: AtomicU64,
}

impl FetchCache {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher, entries: Mutex::new(HashMap::new()), fetches: AtomicU64::new(0) }
    }

    /// Return the cached outcome for `url`, fetching it on first use.
    pub async fn get_or_fetch(&self, url: &str) -> PageResult {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries.entry(url.to_string()).or_default().clone()
        };

        if let Some(result) = cell.get() {
            tracing::debug!(url, "page cache hit");
            return result.clone();
        }

        cell.get_or_init(|| async {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            self.fetcher.fetch(url).await.map(Arc::new)
        })
        .await
        .clone()
    }

    /// Number of URLs with a settled outcome.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of underlying fetches started since creation.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}
