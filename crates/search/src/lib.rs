//! Query orchestration and hybrid search
//!
//! Features:
//! - Deterministic keyword-table intent and urgency classification
//! - Hidden-need inference from conversation history
//! - Dense vector search via Qdrant or an in-process index
//! - Structured filtering and deterministic re-ranking
//! - Two-tier result cache (LRU + optional shared remote tier)
//! - Per-fingerprint single-flight computation de-duplication
//! - Emergency short-circuit path with a fixed in-memory service list
//! - Catalog snapshot loading with embedding backfill

pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod context;
pub mod embeddings;
pub mod emergency;
pub mod engine;
pub mod fingerprint;
pub mod flight;
pub mod vector_index;

pub use cache::{CacheStats, CacheStore, HttpCache, MemoryCache, TieredCache};
pub use catalog::{backfill_embeddings, CatalogHandle, CatalogLoader, CatalogSnapshot};
pub use classifier::{Classification, IntentClassifier};
pub use context::{ContextAnalyzer, ConversationStage, HiddenNeed, MAX_HIDDEN_NEEDS};
pub use embeddings::{HashEmbedder, HttpEmbedder, HttpEmbedderConfig};
pub use emergency::EmergencyHandler;
pub use engine::{EngineConfig, HybridSearchEngine, SearchOutcome};
pub use fingerprint::{normalize_message, QueryFingerprint};
pub use flight::FlightTable;
pub use vector_index::{MemoryIndex, QdrantIndex, QdrantIndexConfig};

use thiserror::Error;

/// Search errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deadline exceeded: {0}")]
    Timeout(String),
}

impl From<SearchError> for support_agent_core::Error {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Embedding(msg) => support_agent_core::Error::Embedding(msg),
            SearchError::Index(msg) | SearchError::Connection(msg) => {
                support_agent_core::Error::Index(msg)
            }
            SearchError::Cache(msg) => support_agent_core::Error::Cache(msg),
            SearchError::Catalog(msg) => support_agent_core::Error::Catalog(msg),
            SearchError::Timeout(msg) => support_agent_core::Error::Index(msg),
        }
    }
}

impl From<support_agent_core::Error> for SearchError {
    fn from(err: support_agent_core::Error) -> Self {
        match err {
            support_agent_core::Error::Embedding(msg) => SearchError::Embedding(msg),
            support_agent_core::Error::Index(msg) => SearchError::Index(msg),
            support_agent_core::Error::Cache(msg) => SearchError::Cache(msg),
            support_agent_core::Error::Catalog(msg) => SearchError::Catalog(msg),
            support_agent_core::Error::InvalidRequest(msg) => SearchError::Catalog(msg),
            support_agent_core::Error::Timeout(ms) => {
                SearchError::Timeout(format!("deadline of {}ms exceeded", ms))
            }
        }
    }
}
