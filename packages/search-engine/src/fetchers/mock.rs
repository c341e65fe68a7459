//! Mock fetcher for testing.
//!
//! Serves canned responses keyed by URL and records every request.

use async_trait::async_trait;
use scraper::Html;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::analysis::html::{extract_links, extract_title};
use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedPage, Fetcher};

/// A canned outcome for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Page(FetchedPage),
    HttpStatus { code: u16, body: String },
    UnsupportedContentType(String),
    MalformedUrl,
    Io(String),
}

impl MockResponse {
    fn into_result(self, url: &Url) -> FetchResult<FetchedPage> {
        match self {
            MockResponse::Page(page) => Ok(page),
            MockResponse::HttpStatus { code, body } => Err(FetchError::HttpStatus { code, body }),
            MockResponse::UnsupportedContentType(content_type) => {
                Err(FetchError::UnsupportedContentType { content_type })
            }
            MockResponse::MalformedUrl => Err(FetchError::MalformedUrl {
                url: url.to_string(),
            }),
            MockResponse::Io(message) => Err(FetchError::Io(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message,
            )))),
        }
    }
}

/// Mock fetcher for testing.
///
/// Unknown URLs answer `404` with body `"not found"`.
///
/// # Example
///
/// ```rust
/// use search_engine::fetchers::MockFetcher;
///
/// let fetcher = MockFetcher::new()
///     .with_html("http://example.test/", r#"<p>Кошка</p><a href="/a">a</a>"#)
///     .with_status("http://example.test/a", 404, "not found");
/// ```
#[derive(Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    calls: Arc<RwLock<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockFetcher {
    /// Create a new empty mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(url: &str) -> String {
        Url::parse(url)
            .map(String::from)
            .unwrap_or_else(|_| url.to_string())
    }

    /// Register a canned response.
    pub fn add_response(&self, url: &str, response: MockResponse) {
        self.responses
            .write()
            .unwrap()
            .insert(Self::key(url), response);
    }

    /// Serve `html` at `url` with status 200; title and links are parsed from it.
    pub fn with_html(self, url: &str, html: &str) -> Self {
        self.set_html(url, html);
        self
    }

    /// Replace what `url` serves, including on clones sharing this mock.
    pub fn set_html(&self, url: &str, html: &str) {
        let document = Html::parse_document(html);
        let mut page = FetchedPage::new(200, html);
        page.title = extract_title(&document);
        if let Ok(base) = Url::parse(url) {
            page.links = extract_links(&document, &base);
        }
        self.add_response(url, MockResponse::Page(page));
    }

    pub fn with_page(self, url: &str, page: FetchedPage) -> Self {
        self.add_response(url, MockResponse::Page(page));
        self
    }

    pub fn with_status(self, url: &str, code: u16, body: &str) -> Self {
        self.add_response(
            url,
            MockResponse::HttpStatus {
                code,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn with_io_error(self, url: &str, message: &str) -> Self {
        self.add_response(url, MockResponse::Io(message.to_string()));
        self
    }

    pub fn with_response(self, url: &str, response: MockResponse) -> Self {
        self.add_response(url, response);
        self
    }

    /// Sleep before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs requested so far, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Number of requests made for one URL.
    pub fn calls_for(&self, url: &str) -> usize {
        let key = Self::key(url);
        self.calls.read().unwrap().iter().filter(|u| **u == key).count()
    }
}

impl Clone for MockFetcher {
    fn clone(&self) -> Self {
        Self {
            responses: Arc::clone(&self.responses),
            calls: Arc::clone(&self.calls),
            delay: self.delay,
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.read().unwrap().get(url.as_str()).cloned();
        response
            .unwrap_or(MockResponse::HttpStatus {
                code: 404,
                body: "not found".to_string(),
            })
            .into_result(url)
    }
}
