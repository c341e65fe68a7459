//! HTTP API for the lemma search engine.
//!
//! Exposes indexing control, search and statistics of a
//! [`SearchEngine`](search_engine::SearchEngine) as JSON endpoints.

pub mod config;
pub mod server;

pub use config::Config;
