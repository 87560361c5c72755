use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use tastematch_api::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, CacheWriterHandle},
    routes::{create_router, AppState},
    services::{
        providers::{CachedEmbedder, Embedder, GeminiClient, PgCorpus},
        RecommendationService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tastematch_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = create_pool(&config.database_url).await?;
    let corpus = Arc::new(PgCorpus::new(db_pool));

    let gemini = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.embedding_model.clone(),
        config.generation_model.clone(),
        config.embedding_dimensions,
        Duration::from_secs(config.http_timeout_secs),
    )?);

    let (embedder, cache_handle): (Arc<dyn Embedder>, Option<CacheWriterHandle>) =
        match &config.redis_url {
            Some(redis_url) => {
                let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
                tracing::info!("Embedding cache enabled");
                let cached: Arc<dyn Embedder> = Arc::new(CachedEmbedder::new(gemini.clone(), cache));
                (cached, Some(handle))
            }
            None => {
                tracing::info!("REDIS_URL not set, embedding cache disabled");
                (gemini.clone() as Arc<dyn Embedder>, None)
            }
        };

    let recommender = RecommendationService::new(
        embedder,
        corpus.clone(),
        corpus,
        gemini,
        config.retrieval_limit,
    );

    let app = create_router(AppState::new(recommender));

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(
        address = %config.listen_addr(),
        embedding_model = %config.embedding_model,
        retrieval_limit = config.retrieval_limit,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
