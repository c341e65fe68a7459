//! Core trait abstractions for the search engine.
//!
//! These traits define the seams for storage, network access and
//! morphology so the crawl and search pipeline can run against
//! in-memory fakes in tests.

pub mod fetcher;
pub mod lemmatizer;
pub mod store;
