//! Collaborator traits
//!
//! The embedding provider and the vector index are external services the
//! core consumes but does not implement. Both are modeled as traits so the
//! engine can be exercised against in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::ResourceCategory;

/// Text embedding provider boundary.
///
/// Implementations must fail fast: an upstream error or a dimension
/// mismatch is an `Err`, never a silently returned zero vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-length vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimension this provider produces
    fn dim(&self) -> usize;
}

/// Structured filter passed to the vector index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexFilter {
    /// Hard category filter; None means unfiltered
    pub category: Option<ResourceCategory>,
}

impl IndexFilter {
    pub fn category(category: ResourceCategory) -> Self {
        Self {
            category: Some(category),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none()
    }
}

/// A scored hit returned by the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub resource_id: String,
    /// Similarity score in [0, 1]
    pub score: f32,
}

/// Similarity-search service boundary
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the k nearest catalog entries for the query vector
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<IndexFilter>,
        k: usize,
    ) -> Result<Vec<IndexHit>>;
}
