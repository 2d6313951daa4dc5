//! Unified error types for shelfscan.
//!
//! `Error` covers faults that reach the HTTP boundary or stop startup.
//! `FetchError` is the per-URL failure that stays inside a search.

/// Unified error types for the shelfscan pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or empty search query.
    #[error("INVALID_QUERY: {0}")]
    InvalidQuery(String),

    /// Registry file could not be read.
    #[error("REGISTRY_UNREADABLE: {path}: {reason}")]
    RegistryUnreadable { path: String, reason: String },

    /// Registry file is not a JSON object of string arrays.
    #[error("REGISTRY_INVALID: {0}")]
    RegistryInvalid(String),

    /// An extraction rule carries a locator that is not a valid CSS selector.
    #[error("INVALID_SELECTOR: {source_name}: {selector}")]
    InvalidSelector { source_name: String, selector: String },

    /// HTTP client could not be constructed.
    #[error("CLIENT_ERROR: {0}")]
    Client(String),
}

impl Error {
    /// Stable machine-readable code, the prefix of the display string.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidQuery(_) => "INVALID_QUERY",
            Error::RegistryUnreadable { .. } => "REGISTRY_UNREADABLE",
            Error::RegistryInvalid(_) => "REGISTRY_INVALID",
            Error::InvalidSelector { .. } => "INVALID_SELECTOR",
            Error::Client(_) => "CLIENT_ERROR",
        }
    }
}

/// Why a single page fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchCause {
    /// No response within the configured timeout.
    #[error("timed out")]
    Timeout,

    /// Connection, DNS or TLS failure.
    #[error("network error: {0}")]
    Connect(String),

    /// Response with a non-success status.
    #[error("status {0}")]
    Status(u16),

    /// Response body larger than the configured limit.
    #[error("{size} bytes exceeds {limit}")]
    TooLarge { size: usize, limit: usize },

    /// URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Body could not be read.
    #[error("failed to read response: {0}")]
    Body(String),

    /// The fetch task panicked or was aborted.
    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

/// A failed fetch of one URL.
///
/// Cloneable so a cached failure can be handed to every caller that asks
/// for the same URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("FETCH_FAILED: {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchCause) -> Self {
        Self { url: url.into(), cause }
    }

    pub fn is_timeout(&self) -> bool {
        self.cause == FetchCause::Timeout
    }
}
