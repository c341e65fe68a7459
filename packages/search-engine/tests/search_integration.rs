//! Integration tests for search and statistics over crawled sites.

use std::sync::Arc;

use search_engine::{
    testing::DictionaryLemmatizer, EngineConfig, MemoryStore, MockFetcher, SearchEngine,
    SearchEngineError, SearchQuery, SiteStatus,
};

fn setup(config: EngineConfig, fetcher: MockFetcher) -> SearchEngine {
    let lemmatizer = DictionaryLemmatizer::new()
        .with_forms("кошка", &["кошки", "кошку", "кошкой"])
        .with_forms("собака", &["собаки", "собаку"])
        .with_service_words(&["и", "на", "во"]);
    SearchEngine::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(fetcher),
        Arc::new(lemmatizer),
    )
}

async fn crawled(config: EngineConfig, fetcher: MockFetcher) -> SearchEngine {
    let engine = setup(config, fetcher);
    engine.start_indexing().await.unwrap();
    engine.wait_idle().await;
    engine
}

fn example_config() -> EngineConfig {
    EngineConfig::new().with_site("http://example.test", "Example")
}

#[tokio::test]
async fn test_search_requires_every_lemma() {
    let fetcher = MockFetcher::new()
        .with_html(
            "http://example.test/",
            r#"<title>Главная</title><p>Кошка и собака.</p><a href="/cats">c</a>"#,
        )
        .with_html("http://example.test/cats", "<title>Кошки</title><p>Кошки спят.</p>");
    let engine = crawled(example_config(), fetcher).await;

    let both = engine.search(&SearchQuery::new("кошки собаки")).await.unwrap();
    assert_eq!(both.count, 1);
    assert_eq!(both.data[0].uri, "");
    assert_eq!(both.data[0].title, "Главная");
    assert_eq!(both.data[0].site, "http://example.test");
    assert!(both.data[0].snippet.contains("<b>Кошка</b>"));
    assert!(both.data[0].snippet.contains("<b>собака</b>"));
    assert!(!both.data[0].snippet.contains("Не найдено"));

    let cats = engine.search(&SearchQuery::new("кошкой")).await.unwrap();
    assert_eq!(cats.count, 2);
    let uris: Vec<&str> = cats.data.iter().map(|r| r.uri.as_str()).collect();
    assert!(uris.contains(&"cats"));
    assert!(cats.data.iter().all(|r| r.relevance > 0.0 && r.relevance <= 1.0));
}

#[tokio::test]
async fn test_search_paginates_by_block() {
    let mut root = String::from("<p>Оглавление</p>");
    let mut fetcher = MockFetcher::new();
    for i in 0..25 {
        root.push_str(&format!(r#"<a href="/p{i}">{i}</a>"#));
        fetcher = fetcher.with_html(
            &format!("http://example.test/p{i}"),
            "<p>Кошка спит на окне.</p>",
        );
    }
    let fetcher = fetcher.with_html("http://example.test/", &root);
    let engine = crawled(example_config(), fetcher).await;

    let last = engine
        .search(&SearchQuery::new("кошка").with_page(2, 10))
        .await
        .unwrap();
    assert_eq!(last.count, 25);
    assert_eq!(last.data.len(), 5);

    let first = engine
        .search(&SearchQuery::new("кошка").with_page(0, 10))
        .await
        .unwrap();
    assert_eq!(first.data.len(), 10);
}

#[tokio::test]
async fn test_snippet_lists_unmatched_words() {
    let fetcher = MockFetcher::new().with_html("http://example.test/", "<p>Кошка спит.</p>");
    let engine = crawled(example_config(), fetcher).await;

    let response = engine.search(&SearchQuery::new("кошка слон")).await.unwrap();

    assert_eq!(response.count, 1);
    assert!(response.data[0].snippet.contains("Не найдено: <s>слон</s>"));
}

#[tokio::test]
async fn test_search_user_errors_and_empty_results() {
    let engine = setup(example_config(), MockFetcher::new());

    let err = engine.search(&SearchQuery::new("")).await.unwrap_err();
    assert!(matches!(err, SearchEngineError::EmptyQuery));

    let response = engine.search(&SearchQuery::new("кошка")).await.unwrap();
    assert_eq!(response.count, 0);
    assert!(response.data.is_empty());
}

#[tokio::test]
async fn test_statistics_reflect_index() {
    let fetcher = MockFetcher::new()
        .with_html("http://example.test/", r#"<p>Кошка спит.</p><a href="/a">a</a>"#)
        .with_html("http://example.test/a", "<p>Собака спит.</p>");
    let engine = crawled(example_config(), fetcher).await;

    let stats = engine.statistics().await.unwrap();

    assert_eq!(stats.total.sites, 1);
    assert_eq!(stats.total.pages, 2);
    assert_eq!(stats.total.lemmas, 3);
    assert!(!stats.total.indexing);
    assert_eq!(stats.detailed.len(), 1);
    let detail = &stats.detailed[0];
    assert_eq!(detail.name, "Example");
    assert_eq!(detail.status, SiteStatus::Indexed);
    assert!(detail.error.is_empty());
    assert!(detail.status_time > 0);
}
