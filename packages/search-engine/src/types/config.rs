//! Configuration types for the engine and its HTTP fetcher.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A site the engine is allowed to crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub url: String,
    pub name: String,
}

impl SiteConfig {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sites crawled by `start_indexing`
    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    /// Maximum snippet window length, in characters
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,

    /// Page tasks allowed to fetch concurrently, across all sessions
    #[serde(default = "default_crawl_concurrency")]
    pub crawl_concurrency: usize,

    /// Sessions allowed to run concurrently
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Delay before each fetch, in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

fn default_snippet_length() -> usize {
    200
}

fn default_crawl_concurrency() -> usize {
    10
}

fn default_max_sessions() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            snippet_length: default_snippet_length(),
            crawl_concurrency: default_crawl_concurrency(),
            max_sessions: default_max_sessions(),
            request_delay_ms: 0,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site(mut self, url: impl Into<String>, name: impl Into<String>) -> Self {
        self.sites.push(SiteConfig::new(url, name));
        self
    }

    pub fn with_sites(mut self, sites: Vec<SiteConfig>) -> Self {
        self.sites = sites;
        self
    }

    pub fn with_snippet_length(mut self, length: usize) -> Self {
        self.snippet_length = length;
        self
    }

    pub fn with_crawl_concurrency(mut self, concurrency: usize) -> Self {
        self.crawl_concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_sessions(mut self, sessions: usize) -> Self {
        self.max_sessions = sessions.max(1);
        self
    }

    pub fn with_request_delay(mut self, ms: u64) -> Self {
        self.request_delay_ms = ms;
        self
    }

    pub fn request_delay(&self) -> Option<Duration> {
        (self.request_delay_ms > 0).then(|| Duration::from_millis(self.request_delay_ms))
    }
}

/// Bot identity and timeouts used by [`HttpFetcher`](crate::fetchers::HttpFetcher).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub referrer: String,
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: "LemmaSearchBot/1.0".to_string(),
            referrer: "http://www.google.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl FetcherConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = referrer.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"sites":[{"url":"http://example.test","name":"Example"}]}"#)
                .unwrap();

        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.snippet_length, 200);
        assert_eq!(config.crawl_concurrency, 10);
        assert!(config.request_delay().is_none());
    }

    #[test]
    fn test_builder_clamps_pool_sizes() {
        let config = EngineConfig::new()
            .with_crawl_concurrency(0)
            .with_max_sessions(0)
            .with_request_delay(50);

        assert_eq!(config.crawl_concurrency, 1);
        assert_eq!(config.max_sessions, 1);
        assert_eq!(config.request_delay(), Some(Duration::from_millis(50)));
    }
}
