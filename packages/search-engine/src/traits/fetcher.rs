//! Fetcher trait - network access plus HTML parsing.

use async_trait::async_trait;
use url::Url;

use crate::error::FetchResult;

/// A successfully fetched document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub status_code: u16,
    /// Raw response body
    pub body: String,
    pub title: Option<String>,
    /// Absolute outbound links, in document order
    pub links: Vec<String>,
}

impl FetchedPage {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            title: None,
            links: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = links.into_iter().map(Into::into).collect();
        self
    }
}

/// Fetches one URL.
///
/// Errors are typed so the crawler can tell per-page failures
/// (`HttpStatus`, `UnsupportedContentType`, `MalformedUrl`) from
/// session-fatal ones (`Io`).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage>;
}
