//! HTTP fetch pipeline for retailer pages.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Limits
//! - Per-request timeout (default: 10s)
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//!
//! ### Caching
//! - [`FetchCache`] memoizes outcomes per URL for the process lifetime and
//!   guarantees at most one in-flight request per URL.

pub mod cache;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use shelfscan_core::{AppConfig, Error, FetchCause, FetchError};
use std::time::{Duration, Instant};

pub use cache::{FetchCache, PageResult};
pub use url::{UrlError, canonicalize};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shelfscan/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 10s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shelfscan/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(10_000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct PageBody {
    /// The URL as requested (registry form)
    pub url: String,
    /// The final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body decoded as UTF-8 (lossy)
    pub html: String,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl PageBody {
    /// A 200 text/html page, for callers that already hold the markup.
    pub fn html(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status: StatusCode::OK,
            content_type: Some("text/html".to_string()),
            html: html.into(),
            fetch_ms: 0,
        }
    }
}

/// Source of raw pages.
///
/// The cache and dispatcher only see this trait, so tests can substitute a
/// network-free implementation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page. Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<PageBody, FetchError>;
}

/// HTTP fetch client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Client(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl PageFetcher for FetchClient {
    async fn fetch(&self, url_str: &str) -> Result<PageBody, FetchError> {
        let start = Instant::now();
        let fail = |cause| FetchError::new(url_str, cause);

        let url = canonicalize(url_str).map_err(|e| fail(FetchCause::InvalidUrl(e.to_string())))?;

        let mut response = self
            .http
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| fail(classify(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FetchCause::Status(status.as_u16())));
        }

        let limit = self.config.max_bytes;
        if let Some(len) = response.content_length() {
            let len = len as usize;
            if len > limit {
                return Err(fail(FetchCause::TooLarge { size: len, limit }));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Chunked and compressed bodies carry no usable length, so the cap is
        // enforced while streaming.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() { fail(FetchCause::Timeout) } else { fail(FetchCause::Body(e.to_string())) }
        })? {
            let size = bytes.len() + chunk.len();
            if size > limit {
                return Err(fail(FetchCause::TooLarge { size, limit }));
            }
            bytes.extend_from_slice(&chunk);
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(url = url_str, %final_url, fetch_ms, bytes = bytes.len(), "fetched page");

        Ok(PageBody {
            url: url_str.to_string(),
            final_url,
            status,
            content_type,
            html: String::from_utf8_lossy(&bytes).into_owned(),
            fetch_ms,
        })
    }
}

fn classify(err: &reqwest::Error) -> FetchCause {
    if err.is_timeout() { FetchCause::Timeout } else { FetchCause::Connect(err.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "shelfscan/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "probe/1".into(), timeout_ms: 2_500, max_bytes: 1024, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "probe/1");
        assert_eq!(config.timeout, Duration::from_millis(2_500));
        assert_eq!(config.max_bytes, 1024);
    }

    #[test]
    fn test_page_body_html() {
        let page = PageBody::html("https://example.com/p", "<html></html>");
        assert_eq!(page.url, "https://example.com/p");
        assert_eq!(page.final_url, "https://example.com/p");
        assert_eq!(page.status, StatusCode::OK);
        assert_eq!(page.content_type.as_deref(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_fails_without_network() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let err = client.fetch("ftp://example.com/file").await.unwrap_err();
        assert_eq!(err.url, "ftp://example.com/file");
        assert!(matches!(err.cause, FetchCause::InvalidUrl(_)));
    }

    /// Serve one canned HTTP response per connection on a local port.
    async fn serve_raw(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}/p")
    }

    fn local_client(timeout: Duration, max_bytes: usize) -> FetchClient {
        FetchClient::new(FetchConfig { timeout, max_bytes, ..Default::default() }).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_reads_body() {
        let url = serve_raw(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<h1>leche</h1>",
        )
        .await;
        let page = local_client(Duration::from_secs(5), 1024).fetch(&url).await.unwrap();
        assert_eq!(page.url, url);
        assert_eq!(page.status, StatusCode::OK);
        assert_eq!(page.content_type.as_deref(), Some("text/html"));
        assert_eq!(page.html, "<h1>leche</h1>");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let url =
            serve_raw("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let err = local_client(Duration::from_secs(5), 1024).fetch(&url).await.unwrap_err();
        assert_eq!(err.url, url);
        assert_eq!(err.cause, FetchCause::Status(503));
    }

    #[tokio::test]
    async fn test_fetch_unanswered_request_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let start = Instant::now();
        let err = local_client(Duration::from_millis(300), 1024)
            .fetch(&format!("http://{addr}/p"))
            .await
            .unwrap_err();
        server.abort();

        assert!(err.is_timeout(), "unexpected cause: {:?}", err.cause);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_fetch_declared_length_over_limit() {
        let url = serve_raw(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n",
        )
        .await;
        let err = local_client(Duration::from_secs(5), 1024).fetch(&url).await.unwrap_err();
        assert_eq!(err.cause, FetchCause::TooLarge { size: 100_000, limit: 1024 });
    }

    #[tokio::test]
    async fn test_fetch_chunked_body_over_limit() {
        // Two 600-byte chunks, no Content-Length.
        static RESPONSE: std::sync::LazyLock<String> = std::sync::LazyLock::new(|| {
            let chunk = "x".repeat(600);
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
                 258\r\n{chunk}\r\n258\r\n{chunk}\r\n0\r\n\r\n"
            )
        });
        let url = serve_raw(RESPONSE.as_str()).await;
        let err = local_client(Duration::from_secs(5), 1024).fetch(&url).await.unwrap_err();
        assert!(
            matches!(err.cause, FetchCause::TooLarge { size, limit: 1024 } if size > 1024),
            "unexpected cause: {:?}",
            err.cause
        );
    }

    #[tokio::test]
    async fn test_fetch_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = local_client(Duration::from_secs(5), 1024)
            .fetch(&format!("http://{addr}/p"))
            .await
            .unwrap_err();
        assert!(matches!(err.cause, FetchCause::Connect(_)), "unexpected cause: {:?}", err.cause);
    }
}
