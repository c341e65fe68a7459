//! Query ranking over the inverted index.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::analysis::VisibleText;
use crate::error::{Result, SearchEngineError};
use crate::pipeline::snippet::SnippetBuilder;
use crate::traits::{lemmatizer::Lemmatizer, store::IndexStore};
use crate::types::{
    lemma::{Lemma, LemmaId},
    page::PageId,
    search::{SearchQuery, SearchResponse, SearchResult},
    site::{Site, SiteId},
};

/// Pages of one site that contain every query lemma seen so far.
#[derive(Debug, Default)]
struct SiteCandidates {
    lemma_ids: Vec<LemmaId>,
    pages: Option<HashSet<PageId>>,
}

/// Answers search queries against an [`IndexStore`].
pub struct Ranker {
    store: Arc<dyn IndexStore>,
    lemmatizer: Arc<dyn Lemmatizer>,
    snippet_length: usize,
}

impl Ranker {
    pub fn new(store: Arc<dyn IndexStore>, lemmatizer: Arc<dyn Lemmatizer>, snippet_length: usize) -> Self {
        Self {
            store,
            lemmatizer,
            snippet_length,
        }
    }

    /// Rank pages containing every query lemma and return one page of results.
    ///
    /// Relevance is the page's summed rank divided by the best page's, so the
    /// top result scores `1.0`. Ties sort by snippet text, descending.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        if query.query.trim().is_empty() {
            return Err(SearchEngineError::EmptyQuery);
        }

        let query_lemmas = self.lemmatizer.lemma_set(&query.query);
        if query_lemmas.is_empty() {
            debug!(query = %query.query, "Query has no significant words");
            return Ok(SearchResponse::empty());
        }

        let site_filter = match &query.site {
            Some(url) => match self.store.find_site_by_url(url).await? {
                Some(site) => Some(site.id),
                None => {
                    debug!(site = %url, "Search restricted to unknown site");
                    return Ok(SearchResponse::empty());
                }
            },
            None => None,
        };

        let texts: Vec<String> = query_lemmas.iter().cloned().collect();
        let lemmas = self.store.find_lemmas_in(&texts, site_filter).await?;
        if lemmas.is_empty() {
            return Ok(SearchResponse::empty());
        }

        let candidates = self.intersect(&lemmas).await?;
        let mut results = self.build_results(candidates, &query_lemmas).await?;

        let max_relevance = results.iter().map(|r| r.relevance).fold(0.0f32, f32::max);
        if max_relevance > 0.0 {
            for result in &mut results {
                result.relevance /= max_relevance;
            }
        }
        results.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| b.snippet.cmp(&a.snippet))
        });

        let count = results.len();
        let data = paginate(results, query.page_index, query.page_size);
        debug!(query = %query.query, count, returned = data.len(), "Search completed");
        Ok(SearchResponse { count, data })
    }

    /// Per site, the pages holding every found lemma.
    ///
    /// A lemma that exists on some site but not on another excludes the other
    /// site entirely.
    async fn intersect(&self, lemmas: &[Lemma]) -> Result<BTreeMap<SiteId, SiteCandidates>> {
        let distinct: HashSet<&str> = lemmas.iter().map(|l| l.lemma.as_str()).collect();
        let mut by_site: BTreeMap<SiteId, SiteCandidates> = BTreeMap::new();

        for lemma in lemmas {
            let pages: HashSet<PageId> = self
                .store
                .find_indexes_for_lemma(lemma.id)
                .await?
                .into_iter()
                .map(|entry| entry.page_id)
                .collect();

            let candidates = by_site.entry(lemma.site_id).or_default();
            candidates.lemma_ids.push(lemma.id);
            candidates.pages = Some(match candidates.pages.take() {
                Some(current) => current.intersection(&pages).copied().collect(),
                None => pages,
            });
        }

        by_site.retain(|_, c| c.lemma_ids.len() == distinct.len());
        Ok(by_site)
    }

    async fn build_results(
        &self,
        candidates: BTreeMap<SiteId, SiteCandidates>,
        query_lemmas: &BTreeSet<String>,
    ) -> Result<Vec<SearchResult>> {
        let sites: HashMap<SiteId, Site> = self
            .store
            .list_sites()
            .await?
            .into_iter()
            .map(|site| (site.id, site))
            .collect();
        let snippets = SnippetBuilder::new(self.lemmatizer.as_ref(), self.snippet_length);

        let mut results = Vec::new();
        for (site_id, candidates) in candidates {
            let Some(site) = sites.get(&site_id) else {
                continue;
            };
            let mut page_ids: Vec<PageId> = candidates.pages.unwrap_or_default().into_iter().collect();
            page_ids.sort_unstable();

            for page_id in page_ids {
                let Some(page) = self.store.get_page(page_id).await? else {
                    continue;
                };
                let relevance: f32 = self
                    .store
                    .find_indexes_for_page_among(page.id, &candidates.lemma_ids)
                    .await?
                    .iter()
                    .map(|entry| entry.rank)
                    .sum();

                let text = VisibleText::parse(&page.content);
                results.push(SearchResult {
                    site: site.url.clone(),
                    site_name: site.name.clone(),
                    uri: page.path.trim_start_matches('/').to_string(),
                    title: text.title.clone(),
                    snippet: snippets.build(&text.snippet_text(), query_lemmas),
                    relevance,
                });
            }
        }
        Ok(results)
    }
}

/// Block `page_index` of `page_size` results; empty past the end.
fn paginate<T>(items: Vec<T>, page_index: usize, page_size: usize) -> Vec<T> {
    items
        .into_iter()
        .skip(page_index.saturating_mul(page_size))
        .take(page_size)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::indexer::Indexer;
    use crate::stores::MemoryStore;
    use crate::testing::DictionaryLemmatizer;
    use crate::traits::store::{PageStore, SiteStore};
    use crate::types::page::Page;
    use proptest::prelude::*;

    struct Fixture {
        store: Arc<MemoryStore>,
        indexer: Indexer,
        lemmatizer: Arc<DictionaryLemmatizer>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let lemmatizer = Arc::new(
                DictionaryLemmatizer::new()
                    .with_forms("кошка", &["кошки", "кошку"])
                    .with_service_words(&["и", "на"]),
            );
            Self {
                indexer: Indexer::new(store.clone()),
                store,
                lemmatizer,
            }
        }

        fn ranker(&self) -> Ranker {
            Ranker::new(self.store.clone(), self.lemmatizer.clone(), 200)
        }

        async fn site(&self, url: &str, name: &str) -> Site {
            self.store.upsert_site(&Site::new(url, name)).await.unwrap()
        }

        async fn page(&self, site: &Site, path: &str, body: &str) {
            let html = format!("<html><head><title>{path}</title></head><body><p>{body}</p></body></html>");
            let page = self
                .store
                .save_page(&Page::new(site.id, path, 200, html))
                .await
                .unwrap();
            let counts = self.lemmatizer.lemmas_and_counts(body);
            self.indexer.apply_page(&page, &counts).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_and_semantics_within_site() {
        let fx = Fixture::new();
        let site = fx.site("http://example.test", "Example").await;
        fx.page(&site, "/both", "кошка дом").await;
        fx.page(&site, "/cat", "кошка").await;

        let response = fx.ranker().search(&SearchQuery::new("кошка дом")).await.unwrap();

        assert_eq!(response.count, 1);
        assert_eq!(response.data[0].uri, "both");
        assert_eq!(response.data[0].title, "/both");
        assert_eq!(response.data[0].relevance, 1.0);
    }

    #[tokio::test]
    async fn test_relevance_relative_to_best_page() {
        let fx = Fixture::new();
        let site = fx.site("http://example.test", "Example").await;
        fx.page(&site, "/many", "кошка кошки кошку кошка").await;
        fx.page(&site, "/one", "кошка").await;

        let response = fx.ranker().search(&SearchQuery::new("кошки")).await.unwrap();

        assert_eq!(response.count, 2);
        assert_eq!(response.data[0].uri, "many");
        assert_eq!(response.data[0].relevance, 1.0);
        assert_eq!(response.data[1].uri, "one");
        assert_eq!(response.data[1].relevance, 0.25);
        assert_eq!(response.data[0].site_name, "Example");
    }

    #[tokio::test]
    async fn test_site_missing_a_lemma_is_excluded() {
        let fx = Fixture::new();
        let first = fx.site("http://first.test", "First").await;
        let second = fx.site("http://second.test", "Second").await;
        fx.page(&first, "/", "кошка дом").await;
        fx.page(&second, "/", "кошка").await;

        let response = fx.ranker().search(&SearchQuery::new("кошка дом")).await.unwrap();

        assert_eq!(response.count, 1);
        assert_eq!(response.data[0].site, "http://first.test");
    }

    #[tokio::test]
    async fn test_site_filter() {
        let fx = Fixture::new();
        let first = fx.site("http://first.test", "First").await;
        let second = fx.site("http://second.test", "Second").await;
        fx.page(&first, "/", "кошка").await;
        fx.page(&second, "/", "кошка").await;

        let ranker = fx.ranker();
        let filtered = ranker
            .search(&SearchQuery::new("кошка").for_site("http://second.test"))
            .await
            .unwrap();
        assert_eq!(filtered.count, 1);
        assert_eq!(filtered.data[0].site_name, "Second");

        let unknown = ranker
            .search(&SearchQuery::new("кошка").for_site("http://nowhere.test"))
            .await
            .unwrap();
        assert_eq!(unknown.count, 0);
    }

    #[tokio::test]
    async fn test_empty_and_service_word_queries() {
        let fx = Fixture::new();
        let ranker = fx.ranker();

        let err = ranker.search(&SearchQuery::new("   ")).await.unwrap_err();
        assert!(matches!(err, SearchEngineError::EmptyQuery));

        let response = ranker.search(&SearchQuery::new("и на")).await.unwrap();
        assert_eq!(response.count, 0);
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_words_are_ignored() {
        let fx = Fixture::new();
        let site = fx.site("http://example.test", "Example").await;
        fx.page(&site, "/", "кошка").await;

        let response = fx.ranker().search(&SearchQuery::new("кошка слон")).await.unwrap();

        assert_eq!(response.count, 1);
        assert!(response.data[0].snippet.contains("<s>слон</s>"));
    }

    #[tokio::test]
    async fn test_pagination_blocks() {
        let fx = Fixture::new();
        let site = fx.site("http://example.test", "Example").await;
        for i in 0..25 {
            fx.page(&site, &format!("/{i:02}"), "кошка").await;
        }
        let ranker = fx.ranker();

        let last = ranker
            .search(&SearchQuery::new("кошка").with_page(2, 10))
            .await
            .unwrap();
        assert_eq!(last.count, 25);
        assert_eq!(last.data.len(), 5);

        let beyond = ranker
            .search(&SearchQuery::new("кошка").with_page(3, 10))
            .await
            .unwrap();
        assert_eq!(beyond.count, 25);
        assert!(beyond.data.is_empty());
    }

    proptest! {
        #[test]
        fn paginate_returns_requested_block(
            total in 0usize..100,
            page_index in 0usize..12,
            page_size in 1usize..30,
        ) {
            let items: Vec<usize> = (0..total).collect();
            let block = paginate(items, page_index, page_size);

            let start = (page_index * page_size).min(total);
            let end = (start + page_size).min(total);
            prop_assert_eq!(block, (start..end).collect::<Vec<_>>());
        }
    }
}
