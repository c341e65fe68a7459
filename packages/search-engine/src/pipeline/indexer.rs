//! Inverted index maintenance.
//!
//! Lemma frequencies are read-modify-write counters shared by every page of
//! a site. All mutations go through one process-wide mutex owned by the
//! [`Indexer`], so `frequency` always equals the number of index rows that
//! reference the lemma, whatever the store's own isolation level.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::traits::store::IndexStore;
use crate::types::{lemma::IndexEntry, page::Page};

pub struct Indexer {
    store: Arc<dyn IndexStore>,
    lock: Mutex<()>,
}

impl Indexer {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Add a stored page's lemma counts to the index.
    ///
    /// Each lemma's frequency grows by one per page regardless of how often
    /// it occurs; the occurrence count becomes the index row's rank.
    pub async fn apply_page(&self, page: &Page, counts: &HashMap<String, usize>) -> Result<()> {
        let mut entries: Vec<(&String, &usize)> = counts.iter().collect();
        entries.sort();

        let _guard = self.lock.lock().await;
        for (text, count) in entries {
            let mut lemma = self.store.find_or_create_lemma(page.site_id, text).await?;
            lemma.frequency += 1;
            self.store.save_lemma(&lemma).await?;
            self.store
                .save_index(&IndexEntry::new(page.id, lemma.id, *count as f32))
                .await?;
        }

        debug!(page_id = page.id, path = %page.path, lemmas = counts.len(), "Page indexed");
        Ok(())
    }

    /// Remove a page and its contribution to the index.
    ///
    /// Lemmas whose frequency drops to zero are deleted.
    pub async fn revert_page(&self, page: &Page) -> Result<()> {
        let _guard = self.lock.lock().await;
        let entries = self.store.find_indexes_for_page(page.id).await?;
        for entry in &entries {
            if let Some(mut lemma) = self.store.get_lemma(entry.lemma_id).await? {
                if lemma.frequency <= 1 {
                    self.store.delete_lemma(lemma.id).await?;
                } else {
                    lemma.frequency -= 1;
                    self.store.save_lemma(&lemma).await?;
                }
            }
            self.store.delete_index(entry.page_id, entry.lemma_id).await?;
        }
        self.store.delete_page(page.id).await?;

        debug!(page_id = page.id, path = %page.path, lemmas = entries.len(), "Page removed from index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::assert_frequency_invariant;
    use crate::traits::store::{LemmaStore, PageStore, SiteStore};
    use crate::types::site::Site;

    fn counts(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    async fn setup() -> (Arc<MemoryStore>, Indexer, Site) {
        let store = Arc::new(MemoryStore::new());
        let site = store
            .upsert_site(&Site::new("http://example.test", "Example"))
            .await
            .unwrap();
        let indexer = Indexer::new(store.clone());
        (store, indexer, site)
    }

    #[tokio::test]
    async fn test_apply_page_counts_pages_not_occurrences() {
        let (store, indexer, site) = setup().await;
        let first = store.save_page(&Page::new(site.id, "/a", 200, "")).await.unwrap();
        let second = store.save_page(&Page::new(site.id, "/b", 200, "")).await.unwrap();

        indexer
            .apply_page(&first, &counts(&[("кошка", 3), ("дом", 1)]))
            .await
            .unwrap();
        indexer.apply_page(&second, &counts(&[("кошка", 1)])).await.unwrap();

        let lemmas = store
            .find_lemmas_in(&["кошка".to_string(), "дом".to_string()], Some(site.id))
            .await
            .unwrap();
        assert_eq!(lemmas[0].lemma, "дом");
        assert_eq!(lemmas[0].frequency, 1);
        assert_eq!(lemmas[1].lemma, "кошка");
        assert_eq!(lemmas[1].frequency, 2);

        let ranks = store.find_indexes_for_page(first.id).await.unwrap();
        let cat_rank = ranks.iter().find(|e| e.lemma_id == lemmas[1].id).unwrap().rank;
        assert_eq!(cat_rank, 3.0);
        assert_frequency_invariant(store.as_ref()).await;
    }

    #[tokio::test]
    async fn test_revert_page_decrements_and_prunes() {
        let (store, indexer, site) = setup().await;
        let first = store.save_page(&Page::new(site.id, "/a", 200, "")).await.unwrap();
        let second = store.save_page(&Page::new(site.id, "/b", 200, "")).await.unwrap();
        indexer
            .apply_page(&first, &counts(&[("кошка", 1), ("дом", 2)]))
            .await
            .unwrap();
        indexer.apply_page(&second, &counts(&[("кошка", 1)])).await.unwrap();

        indexer.revert_page(&first).await.unwrap();

        assert!(store.get_page(first.id).await.unwrap().is_none());
        let lemmas = store.list_lemmas(site.id).await.unwrap();
        assert_eq!(lemmas.len(), 1);
        assert_eq!(lemmas[0].lemma, "кошка");
        assert_eq!(lemmas[0].frequency, 1);
        assert_frequency_invariant(store.as_ref()).await;
    }

    #[tokio::test]
    async fn test_concurrent_pages_do_not_lose_increments() {
        let (store, indexer, site) = setup().await;
        let indexer = Arc::new(indexer);

        let mut handles = Vec::new();
        for i in 0..20 {
            let page = store
                .save_page(&Page::new(site.id, format!("/{i}"), 200, ""))
                .await
                .unwrap();
            let indexer = indexer.clone();
            handles.push(tokio::spawn(async move {
                indexer
                    .apply_page(&page, &counts(&[("кошка", 1), ("дом", 1)]))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for lemma in store.list_lemmas(site.id).await.unwrap() {
            assert_eq!(lemma.frequency, 20);
        }
        assert_frequency_invariant(store.as_ref()).await;
    }
}
