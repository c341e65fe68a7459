// Main entry point for the search API server

use std::sync::Arc;

use anyhow::{Context, Result};
use search_engine::{
    HttpFetcher, IndexStore, MemoryStore, RussianLemmatizer, SearchEngine, SearchEngineError,
};
use search_server::{
    server::{build_app, AppState},
    Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,search_engine=debug,search_server=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting search server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(sites = config.engine.sites.len(), "Configuration loaded");

    let store = open_store(&config).await?;
    let fetcher =
        HttpFetcher::new(config.fetcher.clone()).context("Failed to create HTTP fetcher")?;
    let engine = SearchEngine::new(
        config.engine.clone(),
        store,
        Arc::new(fetcher),
        Arc::new(RussianLemmatizer::new()),
    );

    let app = build_app(AppState::new(engine.clone()));

    // Start server
    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(engine))
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(feature = "postgres")]
async fn open_store(config: &Config) -> Result<Arc<dyn IndexStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let store = search_engine::PostgresStore::new(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected");
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(config: &Config) -> Result<Arc<dyn IndexStore>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
    }
    tracing::info!("Using in-memory store");
    Ok(Arc::new(MemoryStore::new()))
}

/// Resolve on Ctrl-C after stopping any running crawl.
async fn shutdown_signal(engine: SearchEngine) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown requested");
    match engine.stop_indexing().await {
        Ok(()) => tracing::info!("Indexing stopped for shutdown"),
        Err(SearchEngineError::NotRunning) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to stop indexing"),
    }
}
