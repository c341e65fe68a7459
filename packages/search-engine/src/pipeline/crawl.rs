//! Crawl sessions.
//!
//! A session crawls one site (or re-indexes one page) from `INDEXING` to
//! `INDEXED`/`FAILED`. The session driver is the only owner of the [`Site`]
//! row: page tasks run on a bounded pool, report a [`PageOutcome`] and
//! return the links they found; the driver claims each normalized link in
//! its visited set before spawning a task for it, so every URL is processed
//! at most once. The session ends when no task is left in flight.
//!
//! Two tokens gate new fetches. The session token is cancelled by a stop
//! request; its child "running" token is additionally cancelled when a page
//! hits a session-fatal error. In-flight fetches are never interrupted.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::analysis::VisibleText;
use crate::error::{FetchError, Result};
use crate::pipeline::indexer::Indexer;
use crate::pipeline::scope::{SiteScope, UrlClass};
use crate::traits::{
    fetcher::{FetchedPage, Fetcher},
    lemmatizer::Lemmatizer,
    store::IndexStore,
};
use crate::types::{
    config::SiteConfig,
    page::Page,
    site::{Site, SiteId},
};

/// Recorded as the site's last error when a stop request ends its session.
pub const STOPPED_MESSAGE: &str = "Индексация остановлена пользователем";

/// Collaborators shared by every session of an engine.
#[derive(Clone)]
pub struct CrawlContext {
    pub store: Arc<dyn IndexStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub lemmatizer: Arc<dyn Lemmatizer>,
    pub indexer: Arc<Indexer>,
    /// Bounds concurrent fetches across all sessions
    pub fetch_permits: Arc<Semaphore>,
    /// Bounds concurrently running sessions
    pub session_permits: Arc<Semaphore>,
    pub request_delay: Option<Duration>,
}

/// Result of one page task.
#[derive(Debug)]
enum PageOutcome {
    /// Page stored and indexed; its outbound links
    Indexed { links: Vec<String> },
    /// Non-2xx response stored as a page
    Recorded { code: u16 },
    /// Other site, file, already indexed, unsupported or malformed
    Skipped,
    /// Session no longer running; nothing fetched
    Halted,
    /// Session-fatal failure
    Fatal(String),
}

#[derive(Debug, PartialEq, Eq)]
enum SessionOutcome {
    Completed,
    Stopped,
    Failed(String),
}

/// What a page task needs to know about its site.
#[derive(Clone)]
struct SiteTarget {
    site_id: SiteId,
    scope: Arc<SiteScope>,
}

/// Crawl a configured site from its root URL.
///
/// Prior rows for the site's name are purged first.
pub async fn crawl_site(ctx: CrawlContext, config: SiteConfig, cancel: CancellationToken) {
    let scope = match SiteScope::new(&config.url) {
        Ok(scope) => Arc::new(scope),
        Err(e) => {
            error!(site = %config.name, error = %e, "Cannot crawl site");
            return;
        }
    };

    if let Err(e) = ctx.store.delete_sites_by_name(&config.name).await {
        warn!(site = %config.name, error = %e, "Failed to purge previous site data");
    }
    let site = match ctx.store.upsert_site(&Site::new(&config.url, &config.name)).await {
        Ok(site) => site,
        Err(e) => {
            error!(site = %config.name, error = %e, "Failed to create site");
            return;
        }
    };

    let mut session = SiteSession::new(ctx, site, scope, cancel);
    let outcome = match session.acquire_slot().await {
        Some(_permit) => session.crawl().await,
        None => SessionOutcome::Stopped,
    };
    session.finish(outcome).await;
}

/// Re-index one page of a configured site without following its links.
///
/// An existing page at the same path is removed from the index first.
pub async fn reindex_page(ctx: CrawlContext, config: SiteConfig, url: Url, cancel: CancellationToken) {
    let scope = match SiteScope::new(&config.url) {
        Ok(scope) => Arc::new(scope),
        Err(e) => {
            error!(site = %config.name, error = %e, "Cannot index page");
            return;
        }
    };

    let site = match find_or_create_site(&ctx, &config).await {
        Ok(site) => site,
        Err(e) => {
            error!(site = %config.name, error = %e, "Failed to load site");
            return;
        }
    };

    let mut session = SiteSession::new(ctx, site, scope, cancel);
    session.site.mark_indexing();
    session.save_site().await;

    let outcome = match session.acquire_slot().await {
        Some(_permit) => session.reindex(url).await,
        None => SessionOutcome::Stopped,
    };
    session.finish(outcome).await;
}

async fn find_or_create_site(ctx: &CrawlContext, config: &SiteConfig) -> Result<Site> {
    match ctx.store.find_site_by_name(&config.name).await? {
        Some(site) => Ok(site),
        None => ctx.store.upsert_site(&Site::new(&config.url, &config.name)).await,
    }
}

struct SiteSession {
    ctx: CrawlContext,
    site: Site,
    target: SiteTarget,
    cancel: CancellationToken,
}

impl SiteSession {
    fn new(ctx: CrawlContext, site: Site, scope: Arc<SiteScope>, cancel: CancellationToken) -> Self {
        let target = SiteTarget {
            site_id: site.id,
            scope,
        };
        Self {
            ctx,
            site,
            target,
            cancel,
        }
    }

    /// Wait for a session slot; `None` if stopped while waiting.
    async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        tokio::select! {
            permit = self.ctx.session_permits.clone().acquire_owned() => permit.ok(),
            _ = self.cancel.cancelled() => None,
        }
    }

    async fn crawl(&mut self) -> SessionOutcome {
        let running = self.cancel.child_token();
        let mut visited: HashSet<String> = HashSet::new();
        let mut tasks: JoinSet<PageOutcome> = JoinSet::new();

        let root = self.target.scope.root().clone();
        info!(site = %self.site.name, url = %root, "Crawl started");
        visited.insert(root.to_string());
        self.spawn_page(&mut tasks, root, &running);

        let mut outcome = SessionOutcome::Completed;
        let mut indexed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let page_outcome =
                joined.unwrap_or_else(|e| PageOutcome::Fatal(format!("page task failed: {e}")));

            match page_outcome {
                PageOutcome::Indexed { links } => {
                    indexed += 1;
                    self.site.touch();
                    self.save_site().await;
                    for link in links {
                        let Some(url) = self.target.scope.normalize(&link) else {
                            continue;
                        };
                        if running.is_cancelled() {
                            break;
                        }
                        if visited.insert(url.to_string()) {
                            self.spawn_page(&mut tasks, url, &running);
                        }
                    }
                }
                PageOutcome::Recorded { code } => {
                    debug!(site = %self.site.name, code, "Page recorded with error status");
                }
                PageOutcome::Skipped => {}
                PageOutcome::Halted => {
                    if outcome == SessionOutcome::Completed {
                        outcome = SessionOutcome::Stopped;
                    }
                }
                PageOutcome::Fatal(message) => {
                    if !matches!(outcome, SessionOutcome::Failed(_)) {
                        error!(site = %self.site.name, error = %message, "Crawl failed");
                        running.cancel();
                        self.site.mark_failed(message.clone());
                        self.save_site().await;
                        outcome = SessionOutcome::Failed(message);
                    }
                }
            }
        }

        if outcome == SessionOutcome::Completed && self.cancel.is_cancelled() {
            outcome = SessionOutcome::Stopped;
        }
        info!(
            site = %self.site.name,
            pages = indexed,
            visited = visited.len(),
            "Crawl finished"
        );
        outcome
    }

    async fn reindex(&mut self, url: Url) -> SessionOutcome {
        let url = self
            .target
            .scope
            .normalize(url.as_str())
            .unwrap_or(url);

        let path = match self.target.scope.classify(&url) {
            UrlClass::SitePage { path } => path,
            other => {
                debug!(url = %url, class = ?other, "Nothing to index");
                return SessionOutcome::Completed;
            }
        };

        match self.ctx.store.find_page_by_path(self.target.site_id, &path).await {
            Ok(Some(existing)) => {
                if let Err(e) = self.ctx.indexer.revert_page(&existing).await {
                    return SessionOutcome::Failed(e.to_string());
                }
            }
            Ok(None) => {}
            Err(e) => return SessionOutcome::Failed(e.to_string()),
        }

        let running = self.cancel.child_token();
        match process_page(self.ctx.clone(), self.target.clone(), url, running, false).await {
            PageOutcome::Indexed { .. } | PageOutcome::Recorded { .. } | PageOutcome::Skipped => {
                if self.cancel.is_cancelled() {
                    SessionOutcome::Stopped
                } else {
                    SessionOutcome::Completed
                }
            }
            PageOutcome::Halted => SessionOutcome::Stopped,
            PageOutcome::Fatal(message) => SessionOutcome::Failed(message),
        }
    }

    fn spawn_page(&self, tasks: &mut JoinSet<PageOutcome>, url: Url, running: &CancellationToken) {
        tasks.spawn(process_page(
            self.ctx.clone(),
            self.target.clone(),
            url,
            running.clone(),
            true,
        ));
    }

    async fn finish(mut self, outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::Completed => self.site.mark_indexed(),
            SessionOutcome::Stopped => self.site.mark_failed(STOPPED_MESSAGE),
            SessionOutcome::Failed(message) => {
                if !self.site.is_failed() {
                    self.site.mark_failed(message);
                }
            }
        }
        self.save_site().await;
        info!(
            site = %self.site.name,
            status = %self.site.status,
            error = %self.site.last_error,
            "Session finished"
        );
    }

    /// Best effort; status updates never fail a session.
    async fn save_site(&mut self) {
        if let Err(e) = self.ctx.store.upsert_site(&self.site).await {
            warn!(site = %self.site.name, error = %e, "Failed to save site status");
        }
    }
}

async fn process_page(
    ctx: CrawlContext,
    target: SiteTarget,
    url: Url,
    running: CancellationToken,
    skip_existing: bool,
) -> PageOutcome {
    if running.is_cancelled() {
        return PageOutcome::Halted;
    }

    let path = match target.scope.classify(&url) {
        UrlClass::SitePage { path } => path,
        other => {
            debug!(url = %url, class = ?other, "Skipping URL");
            return PageOutcome::Skipped;
        }
    };

    if skip_existing {
        match ctx.store.page_exists_by_path(target.site_id, &path).await {
            Ok(true) => return PageOutcome::Skipped,
            Ok(false) => {}
            Err(e) => return PageOutcome::Fatal(e.to_string()),
        }
    }

    let _permit = tokio::select! {
        permit = ctx.fetch_permits.clone().acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(e) => return PageOutcome::Fatal(e.to_string()),
        },
        _ = running.cancelled() => return PageOutcome::Halted,
    };
    if running.is_cancelled() {
        return PageOutcome::Halted;
    }
    if let Some(delay) = ctx.request_delay {
        tokio::time::sleep(delay).await;
    }

    debug!(url = %url, path = %path, "Fetching page");
    match ctx.fetcher.fetch(&url).await {
        Ok(FetchedPage {
            status_code,
            body,
            links,
            ..
        }) => {
            let page = Page::new(target.site_id, path, status_code, body);
            match store_and_index(&ctx, &page).await {
                Ok(()) => PageOutcome::Indexed { links },
                Err(e) => PageOutcome::Fatal(e.to_string()),
            }
        }
        Err(FetchError::HttpStatus { code, body }) => {
            match ctx.store.save_page(&Page::new(target.site_id, path, code, body)).await {
                Ok(_) => PageOutcome::Recorded { code },
                Err(e) => PageOutcome::Fatal(e.to_string()),
            }
        }
        Err(e) if e.is_session_fatal() => {
            warn!(url = %url, error = %e, "Fetch failed");
            PageOutcome::Fatal(e.to_string())
        }
        Err(e) => {
            debug!(url = %url, reason = %e, "Skipping page");
            PageOutcome::Skipped
        }
    }
}

async fn store_and_index(ctx: &CrawlContext, page: &Page) -> Result<()> {
    let page = ctx.store.save_page(page).await?;
    let text = VisibleText::parse(&page.content);
    let counts = ctx.lemmatizer.lemmas_and_counts(&text.lemma_text());
    ctx.indexer.apply_page(&page, &counts).await
}
