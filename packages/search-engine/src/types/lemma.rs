//! Inverted index types - lemmas and page/lemma associations.

use serde::{Deserialize, Serialize};

use super::page::PageId;
use super::site::SiteId;

/// Store-assigned lemma identifier.
pub type LemmaId = i64;

/// A normalized word form scoped to one site.
///
/// `frequency` is the number of distinct pages on the site containing the
/// lemma, and always equals the number of [`IndexEntry`] rows pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemma {
    /// `0` until the store assigns an id
    pub id: LemmaId,
    pub site_id: SiteId,
    pub lemma: String,
    pub frequency: i32,
}

impl Lemma {
    pub fn new(site_id: SiteId, lemma: impl Into<String>) -> Self {
        Self {
            id: 0,
            site_id,
            lemma: lemma.into(),
            frequency: 0,
        }
    }
}

/// A `(page, lemma)` association; `rank` counts the lemma's word forms on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub page_id: PageId,
    pub lemma_id: LemmaId,
    pub rank: f32,
}

impl IndexEntry {
    pub fn new(page_id: PageId, lemma_id: LemmaId, rank: f32) -> Self {
        Self {
            page_id,
            lemma_id,
            rank,
        }
    }
}
