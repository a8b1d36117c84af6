//! Vector index backends
//!
//! `QdrantIndex` talks to a Qdrant deployment; `MemoryIndex` runs a
//! brute-force scan over the catalog snapshot for tests and small
//! index-free deployments. Both sit behind the `VectorIndex` trait.

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        value::Kind, Condition, CreateCollectionBuilder, Distance, FieldCondition, Filter, Match,
        PointStruct, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    },
    Qdrant,
};

use support_agent_core::{
    Error, IndexFilter, IndexHit, ResourceEntry, Result, VectorIndex,
};

use crate::catalog::CatalogHandle;
use crate::SearchError;

/// Qdrant index configuration
#[derive(Debug, Clone)]
pub struct QdrantIndexConfig {
    /// Qdrant endpoint
    pub endpoint: String,
    /// Collection name
    pub collection: String,
    /// Vector dimension
    pub vector_dim: usize,
    /// API key (optional)
    pub api_key: Option<String>,
}

impl Default for QdrantIndexConfig {
    fn default() -> Self {
        Self {
            endpoint: support_agent_config::constants::endpoints::QDRANT_DEFAULT.to_string(),
            collection: "support_resources".to_string(),
            vector_dim: 384,
            api_key: None,
        }
    }
}

/// Qdrant-backed vector index
pub struct QdrantIndex {
    client: Qdrant,
    config: QdrantIndexConfig,
}

impl QdrantIndex {
    /// Connect to Qdrant
    pub fn new(config: QdrantIndexConfig) -> std::result::Result<Self, SearchError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| SearchError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create the collection if it does not exist
    pub async fn ensure_collection(&self) -> std::result::Result<(), SearchError> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| SearchError::Index(e.to_string()))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                        VectorParamsBuilder::new(self.config.vector_dim as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| SearchError::Index(e.to_string()))?;
        }

        Ok(())
    }

    /// Upsert catalog entries. Point ids are the catalog ordinals; the
    /// stable resource id travels in the payload.
    pub async fn upsert_entries(
        &self,
        entries: &[ResourceEntry],
    ) -> std::result::Result<(), SearchError> {
        let points: Vec<PointStruct> = entries
            .iter()
            .filter(|entry| !entry.embedding.is_empty())
            .map(|entry| {
                let mut payload: std::collections::HashMap<String, qdrant_client::qdrant::Value> =
                    std::collections::HashMap::new();
                payload.insert("resource_id".to_string(), entry.id.clone().into());
                payload.insert(
                    "category".to_string(),
                    entry.category.as_str().to_string().into(),
                );
                payload.insert(
                    "urgency_served".to_string(),
                    entry.urgency_served.as_str().to_string().into(),
                );

                PointStruct::new(entry.ordinal as u64, entry.embedding.clone(), payload)
            })
            .collect();

        if points.is_empty() {
            return Ok(());
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, points))
            .await
            .map_err(|e| SearchError::Index(e.to_string()))?;

        Ok(())
    }

    fn build_filter(filter: &IndexFilter) -> Option<Filter> {
        let category = filter.category?;
        Some(Filter {
            must: vec![Condition {
                condition_one_of: Some(qdrant_client::qdrant::condition::ConditionOneOf::Field(
                    FieldCondition {
                        key: "category".to_string(),
                        r#match: Some(Match {
                            match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(
                                category.as_str().to_string(),
                            )),
                        }),
                        ..Default::default()
                    },
                )),
            }],
            ..Default::default()
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<IndexFilter>,
        k: usize,
    ) -> Result<Vec<IndexHit>> {
        let mut search_builder =
            SearchPointsBuilder::new(&self.config.collection, vector.to_vec(), k as u64)
                .with_payload(true);

        if let Some(qdrant_filter) = filter.as_ref().and_then(Self::build_filter) {
            search_builder = search_builder.filter(qdrant_filter);
        }

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| Error::Index(e.to_string()))?;

        let hits = results
            .result
            .into_iter()
            .filter_map(|point| {
                let resource_id = point.payload.get("resource_id").and_then(|v| {
                    if let Some(Kind::StringValue(s)) = &v.kind {
                        Some(s.clone())
                    } else {
                        None
                    }
                })?;

                Some(IndexHit {
                    resource_id,
                    score: point.score.clamp(0.0, 1.0),
                })
            })
            .collect();

        Ok(hits)
    }
}

/// Brute-force cosine index over the catalog snapshot
pub struct MemoryIndex {
    catalog: CatalogHandle,
}

impl MemoryIndex {
    pub fn new(catalog: CatalogHandle) -> Self {
        Self { catalog }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<IndexFilter>,
        k: usize,
    ) -> Result<Vec<IndexHit>> {
        let snapshot = self.catalog.current();
        let category = filter.and_then(|f| f.category);

        let mut scored: Vec<(f32, usize, String)> = snapshot
            .entries()
            .iter()
            .filter(|entry| !entry.embedding.is_empty())
            .filter(|entry| category.map_or(true, |c| entry.category == c))
            .map(|entry| {
                (
                    Self::cosine(vector, &entry.embedding),
                    entry.ordinal,
                    entry.id.clone(),
                )
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, _, resource_id)| IndexHit { resource_id, score })
            .collect())
    }
}
