//! Search request and response types.

use serde::{Deserialize, Serialize};

/// A ranked search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    /// Restrict results to the site with this URL
    #[serde(default)]
    pub site: Option<String>,
    /// Zero-based block index, not a row offset
    #[serde(default)]
    pub page_index: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    20
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            site: None,
            page_index: 0,
            page_size: default_page_size(),
        }
    }

    pub fn for_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_page(mut self, page_index: usize, page_size: usize) -> Self {
        self.page_index = page_index;
        self.page_size = page_size;
        self
    }
}

/// One ranked page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub site: String,
    pub site_name: String,
    /// Page path without its leading `/`
    pub uri: String,
    pub title: String,
    pub snippet: String,
    /// Relative to the best result, in `(0, 1]`
    pub relevance: f32,
}

/// A page of results plus the total candidate count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub count: usize,
    pub data: Vec<SearchResult>,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self {
            count: 0,
            data: Vec::new(),
        }
    }
}
