//! Random quotes HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use random_quotes::api::rest::{AppState, cors_layer, create_router};
use random_quotes::application::services::{
    LikeBroadcaster, LikeService, QuoteCache, QuoteFetchOrchestrator, QuoteService,
};
use random_quotes::config::{AppConfig, DatabaseSettings};
use random_quotes::infrastructure::persistence::in_memory::InMemoryQuoteStore;
use random_quotes::infrastructure::persistence::postgres::{
    PostgresQuoteLikeRepository, PostgresQuoteRepository, run_migrations,
};
use random_quotes::infrastructure::persistence::{QuoteLikeRepository, QuoteRepository};
use random_quotes::infrastructure::providers::{ProviderChain, ZenQuotesProvider};
use random_quotes::telemetry::init_tracing;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "quotes-server", version, about = "Random quotes service")]
struct Args {
    /// Config file path without extension.
    #[arg(short, long, env = "QUOTES_CONFIG")]
    config: Option<String>,

    /// Overrides `server.port`.
    #[arg(short, long)]
    port: Option<u16>,
}

type Stores = (Arc<dyn QuoteRepository>, Arc<dyn QuoteLikeRepository>);

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    init_tracing(&config.logging);
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let (quotes, likes) = open_stores(&config.database).await?;
    let chain = provider_chain(&config, Arc::clone(&quotes))?;
    tracing::info!(providers = ?chain.names(), "provider chain ready");

    let orchestrator = QuoteFetchOrchestrator::new(chain, Arc::clone(&quotes), config.orchestrator_config());
    let cache = QuoteCache::new(Arc::new(orchestrator), config.cache_config());
    let state = Arc::new(AppState {
        quotes: Arc::new(QuoteService::new(Arc::new(cache), quotes)),
        likes: Arc::new(LikeService::with_policy(likes, config.likes.duplicate_policy)),
        broadcaster: Arc::new(LikeBroadcaster::default()),
        cookie: config.cookie_settings(),
    });
    let router = create_router(state, cors_layer(&config.server.cors_origins));

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn open_stores(settings: &DatabaseSettings) -> Result<Stores> {
    let Some(url) = settings.url.as_deref() else {
        tracing::warn!("no database url configured, using the in-memory quote store");
        let store = Arc::new(InMemoryQuoteStore::new());
        let quotes: Arc<dyn QuoteRepository> = store.clone();
        let likes: Arc<dyn QuoteLikeRepository> = store;
        return Ok((quotes, likes));
    };

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(url)
        .await
        .context("connecting to the quote database")?;
    if settings.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let quotes: Arc<dyn QuoteRepository> = Arc::new(PostgresQuoteRepository::new(pool.clone()));
    let likes: Arc<dyn QuoteLikeRepository> = Arc::new(PostgresQuoteLikeRepository::new(pool));
    Ok((quotes, likes))
}

fn provider_chain(config: &AppConfig, quotes: Arc<dyn QuoteRepository>) -> Result<ProviderChain> {
    let mut builder = ProviderChain::builder();
    if config.providers.zenquotes.enabled {
        let provider = ZenQuotesProvider::new(config.zen_quotes_config(), quotes)
            .context("creating the ZenQuotes provider")?;
        builder = builder.push(Arc::new(provider));
    }
    Ok(builder.build())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
