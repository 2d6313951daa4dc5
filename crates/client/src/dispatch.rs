//! Bounded-concurrency fetch dispatcher.
//!
//! Fetches every URL of a batch through the shared [`FetchCache`] with at
//! most `max_concurrency` requests in flight. Each URL's failure stays with
//! that URL; a panicking fetch task is reported as a failure of its URL.

use std::collections::HashMap;
use std::sync::Arc;

use shelfscan_core::{FetchCause, FetchError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::{FetchCache, PageResult};

/// Default number of concurrent fetches per batch.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Outcome of one URL in a batch.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Position of the URL in the input batch.
    pub index: usize,
    pub url: String,
    pub result: PageResult,
}

/// Issues one cached fetch per URL with bounded concurrency.
#[derive(Clone)]
pub struct Dispatcher {
    cache: Arc<FetchCache>,
    max_concurrency: usize,
}

impl Dispatcher {
    /// `max_concurrency` is clamped to at least 1.
    pub fn new(cache: Arc<FetchCache>, max_concurrency: usize) -> Self {
        Self { cache, max_concurrency: max_concurrency.max(1) }
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Fetch all `urls`, returning one outcome per input URL in completion order.
    ///
    /// Duplicate URLs yield one entry each; the cache makes the second a hit.
    /// `Fetched::index` recovers input order when a caller needs it.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<Fetched> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set = JoinSet::new();
        let mut pending = HashMap::new();

        for (index, url) in urls.iter().enumerate() {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let cache = self.cache.clone();
            let task_url = url.clone();

            let handle = join_set.spawn(async move {
                // NOTE: Hold permit for task duration to enforce concurrency limit
                let _permit = permit;
                let result = cache.get_or_fetch(&task_url).await;
                Fetched { index, url: task_url, result }
            });
            pending.insert(handle.id(), (index, url.clone()));
        }

        let mut fetched = Vec::with_capacity(urls.len());
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((id, item)) => {
                    pending.remove(&id);
                    if let Err(err) = &item.result {
                        tracing::warn!(url = %item.url, error = %err.cause, "fetch failed");
                    }
                    fetched.push(item);
                }
                Err(join_err) => {
                    let (index, url) = pending.remove(&join_err.id()).unwrap_or_default();
                    tracing::warn!(url = %url, error = %join_err, "fetch task failed");
                    let err = FetchError::new(url.clone(), FetchCause::TaskFailed(join_err.to_string()));
                    fetched.push(Fetched { index, url, result: Err(err) });
                }
            }
        }

        fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{PageBody, PageFetcher};
    use crate::test_support::StubFetcher;
    use async_trait::async_trait;
    use std::time::Duration;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://x/{i}")).collect()
    }

    fn stub_with_pages(n: usize) -> StubFetcher {
        urls(n)
            .iter()
            .fold(StubFetcher::new(), |stub, url| stub.page(url, "<p>ok</p>"))
    }

    #[tokio::test]
    async fn test_fetch_all_returns_every_url() {
        let fetcher = Arc::new(stub_with_pages(5));
        let dispatcher = Dispatcher::new(Arc::new(FetchCache::new(fetcher)), DEFAULT_MAX_CONCURRENCY);

        let fetched = dispatcher.fetch_all(&urls(5)).await;

        assert_eq!(fetched.len(), 5);
        assert!(fetched.iter().all(|f| f.result.is_ok()));
        let mut seen: Vec<_> = fetched.iter().map(|f| f.url.clone()).collect();
        seen.sort();
        let mut expected = urls(5);
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fetch_all_bounds_concurrency() {
        let fetcher = Arc::new(stub_with_pages(40).delay(Duration::from_millis(20)));
        let dispatcher = Dispatcher::new(Arc::new(FetchCache::new(fetcher.clone())), 10);

        let fetched = dispatcher.fetch_all(&urls(40)).await;

        assert_eq!(fetched.len(), 40);
        assert!(fetcher.peak_in_flight() <= 10, "peak was {}", fetcher.peak_in_flight());
        assert!(fetcher.peak_in_flight() > 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_siblings() {
        let fetcher = Arc::new(
            StubFetcher::new()
                .page("https://x/a", "a")
                .failure("https://x/b", FetchCause::Timeout)
                .page("https://x/c", "c"),
        );
        let dispatcher = Dispatcher::new(Arc::new(FetchCache::new(fetcher)), 2);
        let batch = vec!["https://x/a".to_string(), "https://x/b".to_string(), "https://x/c".to_string()];

        let fetched = dispatcher.fetch_all(&batch).await;

        assert_eq!(fetched.len(), 3);
        let failed: Vec<_> = fetched.iter().filter_map(|f| f.result.as_ref().err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].url, "https://x/b");
        assert!(failed[0].is_timeout());
    }

    #[tokio::test]
    async fn test_duplicate_urls_each_get_an_outcome() {
        let fetcher = Arc::new(StubFetcher::new().page("https://x/a", "a"));
        let dispatcher = Dispatcher::new(Arc::new(FetchCache::new(fetcher.clone())), 1);
        let batch = vec!["https://x/a".to_string(), "https://x/a".to_string()];

        let fetched = dispatcher.fetch_all(&batch).await;

        assert_eq!(fetched.len(), 2);
        let mut indices: Vec<_> = fetched.iter().map(|f| f.index).collect();
        indices.sort();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(fetcher.calls("https://x/a"), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dispatcher = Dispatcher::new(Arc::new(FetchCache::new(Arc::new(StubFetcher::new()))), 10);
        assert!(dispatcher.fetch_all(&[]).await.is_empty());
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let dispatcher = Dispatcher::new(Arc::new(FetchCache::new(Arc::new(StubFetcher::new()))), 0);
        assert_eq!(dispatcher.max_concurrency(), 1);
    }

    struct PanickingFetcher;

    #[async_trait]
    impl PageFetcher for PanickingFetcher {
        async fn fetch(&self, url: &str) -> Result<PageBody, FetchError> {
            if url.ends_with("boom") {
                panic!("parser exploded");
            }
            Ok(PageBody::html(url, "fine"))
        }
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_failure() {
        let dispatcher = Dispatcher::new(Arc::new(FetchCache::new(Arc::new(PanickingFetcher))), 4);
        let batch = vec!["https://x/ok".to_string(), "https://x/boom".to_string()];

        let fetched = dispatcher.fetch_all(&batch).await;

        assert_eq!(fetched.len(), 2);
        let boom = fetched.iter().find(|f| f.url == "https://x/boom").unwrap();
        assert!(matches!(&boom.result, Err(FetchError { cause: FetchCause::TaskFailed(_), .. })));
        let ok = fetched.iter().find(|f| f.url == "https://x/ok").unwrap();
        assert!(ok.result.is_ok());
    }
}
