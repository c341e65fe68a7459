//! The engine facade: indexing control, search and statistics.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::error::{Result, SearchEngineError};
use crate::pipeline::crawl::{self, CrawlContext};
use crate::pipeline::indexer::Indexer;
use crate::pipeline::ranking::Ranker;
use crate::pipeline::scope::SiteScope;
use crate::traits::{fetcher::Fetcher, lemmatizer::Lemmatizer, store::IndexStore};
use crate::types::{
    config::{EngineConfig, SiteConfig},
    search::{SearchQuery, SearchResponse},
    statistics::{DetailedStatistics, Statistics, TotalStatistics},
};

struct ActiveSession {
    label: String,
    cancel: CancellationToken,
    /// Cancelled when the session task exits, however it exits
    finished: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveSession {
    fn is_active(&self) -> bool {
        !self.finished.is_cancelled()
    }
}

struct EngineInner {
    config: EngineConfig,
    ctx: CrawlContext,
    ranker: Ranker,
    sessions: Mutex<Vec<ActiveSession>>,
}

/// Search engine over a set of configured sites.
///
/// Cheap to clone; clones share sessions and collaborators.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use search_engine::{EngineConfig, HttpFetcher, FetcherConfig, MemoryStore, RussianLemmatizer, SearchEngine, SearchQuery};
///
/// # async fn example() -> search_engine::Result<()> {
/// let config = EngineConfig::new().with_site("https://example.com", "Example");
/// let engine = SearchEngine::new(
///     config,
///     Arc::new(MemoryStore::new()),
///     Arc::new(HttpFetcher::new(FetcherConfig::default())?),
///     Arc::new(RussianLemmatizer::new()),
/// );
///
/// engine.start_indexing().await?;
/// engine.wait_idle().await;
/// let response = engine.search(&SearchQuery::new("поиск")).await?;
/// println!("{} results", response.count);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchEngine {
    inner: Arc<EngineInner>,
}

impl SearchEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn IndexStore>,
        fetcher: Arc<dyn Fetcher>,
        lemmatizer: Arc<dyn Lemmatizer>,
    ) -> Self {
        let ctx = CrawlContext {
            indexer: Arc::new(Indexer::new(store.clone())),
            fetch_permits: Arc::new(Semaphore::new(config.crawl_concurrency.max(1))),
            session_permits: Arc::new(Semaphore::new(config.max_sessions.max(1))),
            request_delay: config.request_delay(),
            store: store.clone(),
            fetcher,
            lemmatizer: lemmatizer.clone(),
        };
        let ranker = Ranker::new(store, lemmatizer, config.snippet_length);

        Self {
            inner: Arc::new(EngineInner {
                config,
                ctx,
                ranker,
                sessions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Start one crawl session per configured site.
    ///
    /// Returns once the sessions are spawned; every site URL is validated
    /// before any session starts.
    pub async fn start_indexing(&self) -> Result<()> {
        let mut sessions = self.inner.sessions.lock().await;
        sessions.retain(ActiveSession::is_active);
        if !sessions.is_empty() {
            return Err(SearchEngineError::AlreadyRunning);
        }

        let sites = &self.inner.config.sites;
        if sites.is_empty() {
            return Err(SearchEngineError::NoSitesConfigured);
        }
        for site in sites {
            SiteScope::new(&site.url)?;
        }

        for site in sites {
            let ctx = self.inner.ctx.clone();
            let config = site.clone();
            self.spawn_session(&mut sessions, site.name.clone(), move |cancel| {
                crawl::crawl_site(ctx, config, cancel)
            });
        }

        info!(sites = sites.len(), "Indexing started");
        Ok(())
    }

    /// Stop every active session and wait for all of them to unwind.
    ///
    /// Sites of stopped sessions end `FAILED`.
    pub async fn stop_indexing(&self) -> Result<()> {
        let mut sessions = self.inner.sessions.lock().await;
        sessions.retain(ActiveSession::is_active);
        if sessions.is_empty() {
            return Err(SearchEngineError::NotRunning);
        }

        info!(sessions = sessions.len(), "Stopping indexing");
        for session in sessions.iter() {
            session.cancel.cancel();
        }
        for session in sessions.drain(..) {
            if let Err(e) = session.handle.await {
                warn!(session = %session.label, error = %e, "Session task ended abnormally");
            }
        }

        info!("Indexing stopped");
        Ok(())
    }

    /// Re-index one page of a configured site.
    ///
    /// The URL may be on a configured site's host or any of its subdomains.
    pub async fn index_single_page(&self, url: &str) -> Result<()> {
        let parsed = Url::parse(url.trim()).map_err(|_| SearchEngineError::BadUrl {
            url: url.to_string(),
        })?;
        let site = self
            .site_for(&parsed)
            .ok_or_else(|| SearchEngineError::OutsideConfiguredSites {
                url: url.to_string(),
            })?;

        let mut sessions = self.inner.sessions.lock().await;
        sessions.retain(ActiveSession::is_active);
        if !sessions.is_empty() {
            return Err(SearchEngineError::AlreadyRunning);
        }

        let ctx = self.inner.ctx.clone();
        let label = format!("{} {}", site.name, parsed);
        self.spawn_session(&mut sessions, label, move |cancel| {
            crawl::reindex_page(ctx, site, parsed, cancel)
        });

        info!(url = %url, "Single page indexing started");
        Ok(())
    }

    fn site_for(&self, url: &Url) -> Option<SiteConfig> {
        self.inner
            .config
            .sites
            .iter()
            .find(|site| {
                SiteScope::new(&site.url)
                    .map(|scope| scope.contains(url))
                    .unwrap_or(false)
            })
            .cloned()
    }

    fn spawn_session<F, Fut>(&self, sessions: &mut Vec<ActiveSession>, label: String, session: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let finished = CancellationToken::new();
        let guard = finished.clone().drop_guard();
        let task = session(cancel.clone());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });

        sessions.push(ActiveSession {
            label,
            cancel,
            finished,
            handle,
        });
    }

    /// Whether any crawl or single-page session is running.
    pub async fn is_indexing(&self) -> bool {
        self.inner
            .sessions
            .lock()
            .await
            .iter()
            .any(ActiveSession::is_active)
    }

    /// Wait until every session running at call time has finished.
    pub async fn wait_idle(&self) {
        let finished: Vec<CancellationToken> = self
            .inner
            .sessions
            .lock()
            .await
            .iter()
            .map(|session| session.finished.clone())
            .collect();
        for token in finished {
            token.cancelled().await;
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        self.inner.ranker.search(query).await
    }

    /// Totals and per-site detail of the stored index.
    pub async fn statistics(&self) -> Result<Statistics> {
        let store = &self.inner.ctx.store;
        let mut total = TotalStatistics {
            indexing: self.is_indexing().await,
            ..Default::default()
        };
        let mut detailed = Vec::new();

        for site in store.list_sites().await? {
            let (pages, lemmas) =
                futures::try_join!(store.count_pages(site.id), store.count_lemmas(site.id))?;
            total.sites += 1;
            total.pages += pages;
            total.lemmas += lemmas;
            detailed.push(DetailedStatistics {
                url: site.url,
                name: site.name,
                status: site.status,
                status_time: site.status_time.timestamp_millis(),
                error: site.last_error,
                pages,
                lemmas,
            });
        }

        Ok(Statistics { total, detailed })
    }
}
