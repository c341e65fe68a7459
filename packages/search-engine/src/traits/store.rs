//! Storage traits for sites, pages and the inverted index.
//!
//! The storage layer is split into focused traits:
//! - `SiteStore`: Site rows and their status
//! - `PageStore`: Fetched pages
//! - `LemmaStore`: Lemmas and page/lemma index rows
//! - `IndexStore`: Composite trait combining all three
//!
//! Implementations guarantee single-row atomicity only. Read-modify-write
//! sequences on lemma frequencies are serialized by the
//! [`Indexer`](crate::pipeline::indexer::Indexer), not by the store.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    lemma::{IndexEntry, Lemma, LemmaId},
    page::{Page, PageId},
    site::{Site, SiteId},
};

/// Storage for site rows.
#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Insert the site when `site.id == 0`, otherwise update it. Returns the stored row.
    async fn upsert_site(&self, site: &Site) -> Result<Site>;

    async fn find_site_by_name(&self, name: &str) -> Result<Option<Site>>;

    async fn find_site_by_url(&self, url: &str) -> Result<Option<Site>>;

    /// Delete every site with this name, cascading its pages, lemmas and index rows.
    async fn delete_sites_by_name(&self, name: &str) -> Result<usize>;

    async fn list_sites(&self) -> Result<Vec<Site>>;
}

/// Storage for fetched pages.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Insert a page and return it with its assigned id.
    async fn save_page(&self, page: &Page) -> Result<Page>;

    async fn get_page(&self, id: PageId) -> Result<Option<Page>>;

    async fn find_page_by_path(&self, site_id: SiteId, path: &str) -> Result<Option<Page>>;

    async fn page_exists_by_path(&self, site_id: SiteId, path: &str) -> Result<bool> {
        Ok(self.find_page_by_path(site_id, path).await?.is_some())
    }

    /// Delete the page row and any index rows still pointing at it.
    async fn delete_page(&self, id: PageId) -> Result<()>;

    async fn count_pages(&self, site_id: SiteId) -> Result<usize>;
}

/// Storage for lemmas and index rows.
#[async_trait]
pub trait LemmaStore: Send + Sync {
    /// Return the site's lemma row, inserting one with `frequency = 0` if absent.
    async fn find_or_create_lemma(&self, site_id: SiteId, text: &str) -> Result<Lemma>;

    async fn get_lemma(&self, id: LemmaId) -> Result<Option<Lemma>>;

    async fn save_lemma(&self, lemma: &Lemma) -> Result<()>;

    async fn delete_lemma(&self, id: LemmaId) -> Result<()>;

    /// Lemma rows whose text is in `texts`, optionally restricted to one site,
    /// ordered by ascending frequency.
    async fn find_lemmas_in(&self, texts: &[String], site_id: Option<SiteId>) -> Result<Vec<Lemma>>;

    async fn list_lemmas(&self, site_id: SiteId) -> Result<Vec<Lemma>>;

    async fn count_lemmas(&self, site_id: SiteId) -> Result<usize>;

    /// Insert or replace the row for `(page_id, lemma_id)`.
    async fn save_index(&self, entry: &IndexEntry) -> Result<()>;

    async fn delete_index(&self, page_id: PageId, lemma_id: LemmaId) -> Result<()>;

    async fn find_indexes_for_page(&self, page_id: PageId) -> Result<Vec<IndexEntry>>;

    async fn find_indexes_for_page_among(
        &self,
        page_id: PageId,
        lemma_ids: &[LemmaId],
    ) -> Result<Vec<IndexEntry>> {
        Ok(self
            .find_indexes_for_page(page_id)
            .await?
            .into_iter()
            .filter(|entry| lemma_ids.contains(&entry.lemma_id))
            .collect())
    }

    async fn find_indexes_for_lemma(&self, lemma_id: LemmaId) -> Result<Vec<IndexEntry>>;
}

/// Composite trait for the full index store.
pub trait IndexStore: SiteStore + PageStore + LemmaStore {}

impl<T: SiteStore + PageStore + LemmaStore> IndexStore for T {}
