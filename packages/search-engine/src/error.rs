//! Typed errors for the search engine library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). User-facing variants
//! carry the exact messages the API returns to callers.

use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum SearchEngineError {
    /// A crawl or single-page session is still active
    #[error("Индексация уже запущена")]
    AlreadyRunning,

    /// Configuration lists no sites to crawl
    #[error("В конфигурационном файле не указаны сайты для индексации")]
    NoSitesConfigured,

    /// Stop requested while nothing is running
    #[error("Индексация не запущена")]
    NotRunning,

    /// URL could not be parsed
    #[error("Плохой url: {url}")]
    BadUrl { url: String },

    /// URL does not belong to any configured site
    #[error("Данная страница находится за пределами сайтов, указанных в конфигурационном файле")]
    OutsideConfiguredSites { url: String },

    /// Search query had no words
    #[error("Задан пустой поисковый запрос")]
    EmptyQuery,

    /// Fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl SearchEngineError {
    /// Wrap any storage backend error.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }

    /// Errors caused by the caller's request rather than by the engine.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning
                | Self::NoSitesConfigured
                | Self::NotRunning
                | Self::BadUrl { .. }
                | Self::OutsideConfiguredSites { .. }
                | Self::EmptyQuery
        )
    }
}

/// Errors produced by a [`Fetcher`](crate::traits::fetcher::Fetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-success status
    #[error("HTTP {code}")]
    HttpStatus { code: u16, body: String },

    /// Response is not an HTML/text document
    #[error("unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// Link could not be turned into a request
    #[error("malformed URL: {url}")]
    MalformedUrl { url: String },

    /// Transport failure (connection reset, timeout, DNS)
    #[error("I/O error: {0}")]
    Io(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    /// Failures that end a crawl session instead of a single page.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SearchEngineError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
