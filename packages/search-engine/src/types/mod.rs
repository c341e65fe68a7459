//! Data types for sites, pages, the inverted index and search responses.

pub mod config;
pub mod lemma;
pub mod page;
pub mod search;
pub mod site;
pub mod statistics;
