//! Support Agent Server Entry Point

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use support_agent_config::{load_settings, Settings};
use support_agent_core::{Embedder, VectorIndex};
use support_agent_search::{
    backfill_embeddings, CacheStore, CatalogHandle, CatalogLoader, CatalogSnapshot, EngineConfig,
    HttpCache, HttpEmbedder, HttpEmbedderConfig, HybridSearchEngine, MemoryCache, MemoryIndex,
    QdrantIndex, QdrantIndexConfig, TieredCache,
};
use support_agent_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("SUPPORT_AGENT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Support Agent Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_env = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let _metrics_handle = init_metrics();
    tracing::info!("Initialized Prometheus metrics at /metrics");

    // Embedding provider
    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(HttpEmbedderConfig {
        endpoint: config.search.embed_endpoint.clone(),
        model: config.search.embed_model.clone(),
        embedding_dim: config.search.vector_dim,
        timeout: Duration::from_millis(config.search.embed_timeout_ms),
    })?);

    // Catalog ingestion: load, backfill embeddings, snapshot.
    // A missing catalog is not fatal; the engine degrades until a reload.
    let mut entries = match CatalogLoader::load_file(&config.catalog.path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                path = %config.catalog.path,
                error = %e,
                "Failed to load catalog; starting with an empty snapshot"
            );
            Vec::new()
        }
    };

    if config.catalog.backfill_embeddings && !entries.is_empty() {
        match backfill_embeddings(&mut entries, embedder.as_ref()).await {
            Ok(embedded) => {
                if embedded > 0 {
                    tracing::info!(embedded, "Catalog embedding backfill complete");
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Embedding backfill failed; entries without vectors will not be searchable"
                );
            }
        }
    }

    let catalog = CatalogHandle::new(CatalogSnapshot::from_entries(entries));

    // Vector index: Qdrant when configured, in-process scan otherwise.
    let index = build_index(&config, &catalog).await;

    // Cache tier: in-process LRU, optionally layered under a shared
    // remote tier.
    let cache = build_cache(&config)?;

    let engine = Arc::new(HybridSearchEngine::new(
        EngineConfig::from(&config),
        embedder,
        index,
        cache,
        catalog.clone(),
    ));

    tracing::info!(
        catalog_entries = catalog.current().len(),
        qdrant = config.search.qdrant_enabled,
        remote_cache = config.cache.remote_enabled,
        "Initialized application state"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, engine, catalog);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Build the vector index, falling back to the in-process scan when
/// Qdrant is unavailable.
async fn build_index(config: &Settings, catalog: &CatalogHandle) -> Arc<dyn VectorIndex> {
    if !config.search.qdrant_enabled {
        tracing::info!("Qdrant disabled, using in-process vector index");
        return Arc::new(MemoryIndex::new(catalog.clone()));
    }

    let qdrant_config = QdrantIndexConfig {
        endpoint: config.search.qdrant_endpoint.clone(),
        collection: config.search.qdrant_collection.clone(),
        vector_dim: config.search.vector_dim,
        api_key: config.search.qdrant_api_key.clone(),
    };

    match QdrantIndex::new(qdrant_config) {
        Ok(index) => {
            if let Err(e) = index.ensure_collection().await {
                tracing::warn!(error = %e, "Qdrant unavailable, falling back to in-process index");
                return Arc::new(MemoryIndex::new(catalog.clone()));
            }
            let snapshot = catalog.current();
            if let Err(e) = index.upsert_entries(snapshot.entries()).await {
                tracing::warn!(error = %e, "Failed to upsert catalog into Qdrant");
            }
            tracing::info!(
                endpoint = %config.search.qdrant_endpoint,
                collection = %config.search.qdrant_collection,
                "Qdrant index initialized"
            );
            Arc::new(index)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Qdrant, falling back to in-process index");
            Arc::new(MemoryIndex::new(catalog.clone()))
        }
    }
}

/// Build the cache tier
fn build_cache(config: &Settings) -> anyhow::Result<Arc<dyn CacheStore>> {
    let local: Arc<dyn CacheStore> = Arc::new(MemoryCache::new(config.cache.capacity));

    if !config.cache.remote_enabled {
        return Ok(local);
    }

    let endpoint = config
        .cache
        .remote_endpoint
        .clone()
        .ok_or_else(|| anyhow::anyhow!("cache.remote_endpoint is required when remote_enabled"))?;

    let remote = Arc::new(HttpCache::new(
        endpoint.clone(),
        Duration::from_millis(config.cache.remote_timeout_ms),
    )?);

    tracing::info!(endpoint = %endpoint, "Remote cache tier enabled");
    Ok(Arc::new(TieredCache::new(
        remote,
        local,
        Duration::from_secs(config.cache.ttl_secs),
    )))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing from observability settings
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("support_agent={},tower_http=info", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
