//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{Result, SearchEngineError};
use crate::traits::store::{LemmaStore, PageStore, SiteStore};
use crate::types::{
    lemma::{IndexEntry, Lemma, LemmaId},
    page::{Page, PageId},
    site::{Site, SiteId},
};

#[derive(Default)]
struct Tables {
    sites: BTreeMap<SiteId, Site>,
    pages: BTreeMap<PageId, Page>,
    lemmas: BTreeMap<LemmaId, Lemma>,
    indexes: BTreeMap<(PageId, LemmaId), IndexEntry>,
}

impl Tables {
    fn remove_page_cascade(&mut self, page_id: PageId) {
        self.pages.remove(&page_id);
        self.indexes.retain(|(p, _), _| *p != page_id);
    }
}

/// In-memory storage for sites, pages, lemmas and index rows.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart. Enforces the same uniqueness rules as the
/// Postgres schema: `(site, path)` for pages and `(site, lemma)` for lemmas.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the number of stored pages across all sites.
    pub async fn page_count(&self) -> usize {
        self.tables.read().await.pages.len()
    }

    /// Get the number of stored lemmas across all sites.
    pub async fn lemma_count(&self) -> usize {
        self.tables.read().await.lemmas.len()
    }

    /// Get the number of stored index rows.
    pub async fn index_count(&self) -> usize {
        self.tables.read().await.indexes.len()
    }
}

#[async_trait]
impl SiteStore for MemoryStore {
    async fn upsert_site(&self, site: &Site) -> Result<Site> {
        let mut tables = self.tables.write().await;
        let mut stored = site.clone();
        if stored.id == 0 {
            stored.id = self.next_id();
        } else if !tables.sites.contains_key(&stored.id) {
            return Err(SearchEngineError::storage(format!(
                "site {} does not exist",
                stored.id
            )));
        }
        tables.sites.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_site_by_name(&self, name: &str) -> Result<Option<Site>> {
        Ok(self
            .tables
            .read()
            .await
            .sites
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn find_site_by_url(&self, url: &str) -> Result<Option<Site>> {
        Ok(self
            .tables
            .read()
            .await
            .sites
            .values()
            .find(|s| s.url == url)
            .cloned())
    }

    async fn delete_sites_by_name(&self, name: &str) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let site_ids: Vec<SiteId> = tables
            .sites
            .values()
            .filter(|s| s.name == name)
            .map(|s| s.id)
            .collect();

        for site_id in &site_ids {
            tables.sites.remove(site_id);
            let page_ids: Vec<PageId> = tables
                .pages
                .values()
                .filter(|p| p.site_id == *site_id)
                .map(|p| p.id)
                .collect();
            for page_id in page_ids {
                tables.remove_page_cascade(page_id);
            }
            tables.lemmas.retain(|_, l| l.site_id != *site_id);
        }

        Ok(site_ids.len())
    }

    async fn list_sites(&self) -> Result<Vec<Site>> {
        Ok(self.tables.read().await.sites.values().cloned().collect())
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn save_page(&self, page: &Page) -> Result<Page> {
        let mut tables = self.tables.write().await;
        if !tables.sites.contains_key(&page.site_id) {
            return Err(SearchEngineError::storage(format!(
                "site {} does not exist",
                page.site_id
            )));
        }
        let duplicate = tables
            .pages
            .values()
            .any(|p| p.site_id == page.site_id && p.path == page.path && p.id != page.id);
        if duplicate {
            return Err(SearchEngineError::storage(format!(
                "page {} already exists for site {}",
                page.path, page.site_id
            )));
        }

        let mut stored = page.clone();
        if stored.id == 0 {
            stored.id = self.next_id();
        }
        tables.pages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_page(&self, id: PageId) -> Result<Option<Page>> {
        Ok(self.tables.read().await.pages.get(&id).cloned())
    }

    async fn find_page_by_path(&self, site_id: SiteId, path: &str) -> Result<Option<Page>> {
        Ok(self
            .tables
            .read()
            .await
            .pages
            .values()
            .find(|p| p.site_id == site_id && p.path == path)
            .cloned())
    }

    async fn delete_page(&self, id: PageId) -> Result<()> {
        self.tables.write().await.remove_page_cascade(id);
        Ok(())
    }

    async fn count_pages(&self, site_id: SiteId) -> Result<usize> {
        Ok(self
            .tables
            .read()
            .await
            .pages
            .values()
            .filter(|p| p.site_id == site_id)
            .count())
    }
}

#[async_trait]
impl LemmaStore for MemoryStore {
    async fn find_or_create_lemma(&self, site_id: SiteId, text: &str) -> Result<Lemma> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .lemmas
            .values()
            .find(|l| l.site_id == site_id && l.lemma == text)
        {
            return Ok(existing.clone());
        }

        let mut lemma = Lemma::new(site_id, text);
        lemma.id = self.next_id();
        tables.lemmas.insert(lemma.id, lemma.clone());
        Ok(lemma)
    }

    async fn get_lemma(&self, id: LemmaId) -> Result<Option<Lemma>> {
        Ok(self.tables.read().await.lemmas.get(&id).cloned())
    }

    async fn save_lemma(&self, lemma: &Lemma) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.lemmas.get_mut(&lemma.id) {
            Some(stored) => {
                *stored = lemma.clone();
                Ok(())
            }
            None => Err(SearchEngineError::storage(format!(
                "lemma {} does not exist",
                lemma.id
            ))),
        }
    }

    async fn delete_lemma(&self, id: LemmaId) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.lemmas.remove(&id);
        tables.indexes.retain(|(_, l), _| *l != id);
        Ok(())
    }

    async fn find_lemmas_in(&self, texts: &[String], site_id: Option<SiteId>) -> Result<Vec<Lemma>> {
        let tables = self.tables.read().await;
        let mut lemmas: Vec<Lemma> = tables
            .lemmas
            .values()
            .filter(|l| site_id.map_or(true, |id| l.site_id == id))
            .filter(|l| texts.contains(&l.lemma))
            .cloned()
            .collect();
        lemmas.sort_by_key(|l| (l.frequency, l.id));
        Ok(lemmas)
    }

    async fn list_lemmas(&self, site_id: SiteId) -> Result<Vec<Lemma>> {
        Ok(self
            .tables
            .read()
            .await
            .lemmas
            .values()
            .filter(|l| l.site_id == site_id)
            .cloned()
            .collect())
    }

    async fn count_lemmas(&self, site_id: SiteId) -> Result<usize> {
        Ok(self
            .tables
            .read()
            .await
            .lemmas
            .values()
            .filter(|l| l.site_id == site_id)
            .count())
    }

    async fn save_index(&self, entry: &IndexEntry) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.pages.contains_key(&entry.page_id) || !tables.lemmas.contains_key(&entry.lemma_id) {
            return Err(SearchEngineError::storage(format!(
                "index row references missing page {} or lemma {}",
                entry.page_id, entry.lemma_id
            )));
        }
        tables
            .indexes
            .insert((entry.page_id, entry.lemma_id), *entry);
        Ok(())
    }

    async fn delete_index(&self, page_id: PageId, lemma_id: LemmaId) -> Result<()> {
        self.tables
            .write()
            .await
            .indexes
            .remove(&(page_id, lemma_id));
        Ok(())
    }

    async fn find_indexes_for_page(&self, page_id: PageId) -> Result<Vec<IndexEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .indexes
            .range((page_id, LemmaId::MIN)..=(page_id, LemmaId::MAX))
            .map(|(_, entry)| *entry)
            .collect())
    }

    async fn find_indexes_for_lemma(&self, lemma_id: LemmaId) -> Result<Vec<IndexEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .indexes
            .values()
            .filter(|entry| entry.lemma_id == lemma_id)
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_site() -> (MemoryStore, Site) {
        let store = MemoryStore::new();
        let site = store
            .upsert_site(&Site::new("http://example.test", "Example"))
            .await
            .unwrap();
        (store, site)
    }

    #[tokio::test]
    async fn test_upsert_site_assigns_id_then_updates() {
        let (store, mut site) = store_with_site().await;
        assert!(site.id > 0);

        site.mark_indexed();
        let updated = store.upsert_site(&site).await.unwrap();
        assert_eq!(updated.id, site.id);
        assert_eq!(store.list_sites().await.unwrap().len(), 1);
        assert!(store.find_site_by_url("http://example.test").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_page_rejects_duplicate_path() {
        let (store, site) = store_with_site().await;
        store.save_page(&Page::new(site.id, "/a", 200, "a")).await.unwrap();

        let result = store.save_page(&Page::new(site.id, "/a", 200, "again")).await;
        assert!(matches!(result, Err(SearchEngineError::Storage(_))));
        assert!(store.page_exists_by_path(site.id, "/a").await.unwrap());
        assert!(!store.page_exists_by_path(site.id, "/b").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_or_create_lemma_is_unique_per_site() {
        let (store, site) = store_with_site().await;
        let first = store.find_or_create_lemma(site.id, "кот").await.unwrap();
        let second = store.find_or_create_lemma(site.id, "кот").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.frequency, 0);
        assert_eq!(store.count_lemmas(site.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_lemmas_in_orders_by_frequency() {
        let (store, site) = store_with_site().await;
        let mut common = store.find_or_create_lemma(site.id, "кот").await.unwrap();
        common.frequency = 5;
        store.save_lemma(&common).await.unwrap();
        let mut rare = store.find_or_create_lemma(site.id, "пёс").await.unwrap();
        rare.frequency = 1;
        store.save_lemma(&rare).await.unwrap();
        store.find_or_create_lemma(site.id, "дом").await.unwrap();

        let texts = vec!["кот".to_string(), "пёс".to_string()];
        let found = store.find_lemmas_in(&texts, Some(site.id)).await.unwrap();
        let names: Vec<_> = found.iter().map(|l| l.lemma.as_str()).collect();
        assert_eq!(names, vec!["пёс", "кот"]);

        assert!(store.find_lemmas_in(&texts, Some(site.id + 100)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_sites_by_name_cascades() {
        let (store, site) = store_with_site().await;
        let page = store.save_page(&Page::new(site.id, "/", 200, "body")).await.unwrap();
        let lemma = store.find_or_create_lemma(site.id, "кот").await.unwrap();
        store.save_index(&IndexEntry::new(page.id, lemma.id, 2.0)).await.unwrap();

        let deleted = store.delete_sites_by_name("Example").await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.page_count().await, 0);
        assert_eq!(store.lemma_count().await, 0);
        assert_eq!(store.index_count().await, 0);
    }

    #[tokio::test]
    async fn test_index_rows_by_page_and_lemma() {
        let (store, site) = store_with_site().await;
        let page = store.save_page(&Page::new(site.id, "/", 200, "body")).await.unwrap();
        let cat = store.find_or_create_lemma(site.id, "кот").await.unwrap();
        let dog = store.find_or_create_lemma(site.id, "пёс").await.unwrap();
        store.save_index(&IndexEntry::new(page.id, cat.id, 2.0)).await.unwrap();
        store.save_index(&IndexEntry::new(page.id, dog.id, 1.0)).await.unwrap();

        assert_eq!(store.find_indexes_for_page(page.id).await.unwrap().len(), 2);
        let among = store
            .find_indexes_for_page_among(page.id, &[dog.id])
            .await
            .unwrap();
        assert_eq!(among, vec![IndexEntry::new(page.id, dog.id, 1.0)]);
        assert_eq!(store.find_indexes_for_lemma(cat.id).await.unwrap().len(), 1);

        store.delete_page(page.id).await.unwrap();
        assert_eq!(store.index_count().await, 0);
    }
}
