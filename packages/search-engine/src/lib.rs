//! Lemma Search Engine Library
//!
//! Crawls a configured set of sites, builds a lemma-based inverted index of
//! their pages and answers ranked keyword queries with highlighted snippets.
//!
//! # Usage
//!
//! ```rust,ignore
//! use search_engine::{EngineConfig, MemoryStore, SearchEngine, SearchQuery};
//! use search_engine::testing::DictionaryLemmatizer;
//! use search_engine::MockFetcher;
//!
//! let fetcher = MockFetcher::new()
//!     .with_html("http://example.test/", "<p>Кошка спит</p>");
//! let engine = SearchEngine::new(
//!     EngineConfig::new().with_site("http://example.test", "Example"),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(fetcher),
//!     Arc::new(DictionaryLemmatizer::new()),
//! );
//!
//! engine.start_indexing().await?;
//! engine.wait_idle().await;
//! let response = engine.search(&SearchQuery::new("кошка")).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (IndexStore, Fetcher, Lemmatizer)
//! - [`types`] - Sites, pages, lemmas, configuration and responses
//! - [`pipeline`] - Crawl sessions, indexing, ranking and snippets
//! - [`stores`] - Storage implementations (MemoryStore, PostgresStore)
//! - [`fetchers`] - Fetcher implementations (HttpFetcher, MockFetcher)
//! - [`analysis`] - Visible text extraction and Russian lemmatization
//! - [`testing`] - Helpers for tests

pub mod analysis;
pub mod error;
pub mod fetchers;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{FetchError, FetchResult, Result, SearchEngineError};
pub use traits::{
    fetcher::{FetchedPage, Fetcher},
    lemmatizer::Lemmatizer,
    store::{IndexStore, LemmaStore, PageStore, SiteStore},
};
pub use types::{
    config::{EngineConfig, FetcherConfig, SiteConfig},
    lemma::{IndexEntry, Lemma, LemmaId},
    page::{Page, PageId},
    search::{SearchQuery, SearchResponse, SearchResult},
    site::{Site, SiteId, SiteStatus},
    statistics::{DetailedStatistics, Statistics, TotalStatistics},
};

pub use pipeline::SearchEngine;

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;

// Re-export implementations
pub use analysis::RussianLemmatizer;
pub use fetchers::{HttpFetcher, MockFetcher, MockResponse};
