//! Crawl, index and search pipeline.
//!
//! - [`scope`] decides which URLs belong to a site and where they are stored
//! - [`crawl`] drives crawl and single-page sessions
//! - [`indexer`] keeps lemma frequencies consistent with index rows
//! - [`ranking`] and [`snippet`] answer queries
//! - [`engine`] ties them together behind [`SearchEngine`]

pub mod crawl;
pub mod engine;
pub mod indexer;
pub mod ranking;
pub mod scope;
pub mod snippet;

pub use crawl::{CrawlContext, STOPPED_MESSAGE};
pub use engine::SearchEngine;
pub use indexer::Indexer;
pub use ranking::Ranker;
pub use scope::{SiteScope, UrlClass};
pub use snippet::SnippetBuilder;
