//! HTTP fetcher backed by reqwest and scraper.

use async_trait::async_trait;
use reqwest::StatusCode;
use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::analysis::html::{extract_links, extract_title};
use crate::error::{FetchError, FetchResult, SearchEngineError};
use crate::traits::fetcher::{FetchedPage, Fetcher};
use crate::types::config::FetcherConfig;

/// Content types treated as HTML documents.
const DOCUMENT_CONTENT_TYPES: [&str; 3] = ["text/", "application/xhtml+xml", "application/xml"];

/// Fetches pages over HTTP with the configured bot identity.
///
/// # Example
///
/// ```rust,ignore
/// use search_engine::fetchers::HttpFetcher;
/// use search_engine::types::config::FetcherConfig;
///
/// let fetcher = HttpFetcher::new(FetcherConfig::default())?;
/// let page = fetcher.fetch(&"https://example.com".parse()?).await?;
/// ```
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, SearchEngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| SearchEngineError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn is_document(content_type: &str) -> bool {
        let content_type = content_type.to_ascii_lowercase();
        DOCUMENT_CONTENT_TYPES
            .iter()
            .any(|prefix| content_type.starts_with(prefix))
    }

    /// Reject successful non-documents before their body is downloaded.
    /// Error statuses keep their body for the recorded page.
    fn check_content_type(status: StatusCode, content_type: Option<String>) -> FetchResult<()> {
        match content_type {
            Some(content_type) if status.is_success() && !Self::is_document(&content_type) => {
                Err(FetchError::UnsupportedContentType { content_type })
            }
            _ => Ok(()),
        }
    }

    /// Parse the body off the async path; `Html` is not `Send`.
    fn parse(status_code: u16, body: String, final_url: &Url) -> FetchedPage {
        let document = Html::parse_document(&body);
        let title = extract_title(&document);
        let links = extract_links(&document, final_url);

        FetchedPage {
            status_code,
            body,
            title,
            links,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::MalformedUrl {
                url: url.to_string(),
            });
        }

        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::REFERER, &self.config.referrer)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    FetchError::MalformedUrl {
                        url: url.to_string(),
                    }
                } else {
                    warn!(url = %url, error = %e, "HTTP request failed");
                    FetchError::Io(Box::new(e))
                }
            })?;

        let status = response.status();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Self::check_content_type(status, content_type)?;

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Io(Box::new(e)))?;

        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "HTTP status error");
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
                body,
            });
        }

        Ok(Self::parse(status.as_u16(), body, &final_url))
    }
}
