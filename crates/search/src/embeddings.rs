//! Embedding providers
//!
//! The embedding provider is an external service; `HttpEmbedder` talks to
//! an Ollama-compatible embedding API. `HashEmbedder` is a deterministic
//! stand-in for tests and index-free development.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use support_agent_core::{Embedder, Error, Result};

/// HTTP embedder configuration
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// Embedding API endpoint
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Embedding dimension
    pub embedding_dim: usize,
    /// Per-request deadline
    pub timeout: Duration,
}

impl Default for HttpEmbedderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            embedding_dim: 384,
            timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding client for an Ollama-compatible API
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Embedding(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: self.config.model.clone(),
            input: text.to_string(),
        };

        let url = format!("{}/api/embed", self.config.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "embedding API returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("failed to parse embedding response: {}", e)))?;

        let vector = parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("no embedding returned".to_string()))?;

        // Fail fast on malformed vectors; a zero vector would silently
        // break every similarity comparison downstream.
        if vector.len() != self.config.embedding_dim {
            return Err(Error::Embedding(format!(
                "expected dimension {}, got {}",
                self.config.embedding_dim,
                vector.len()
            )));
        }
        if vector.iter().all(|v| *v == 0.0) {
            return Err(Error::Embedding("provider returned a zero vector".to_string()));
        }

        Ok(vector)
    }

    fn dim(&self) -> usize {
        self.config.embedding_dim
    }
}

/// Deterministic hash-based embedder (no model required).
///
/// Produces normalized vectors whose similarity loosely tracks shared
/// characters, enough for tests and local development.
pub struct HashEmbedder {
    embedding_dim: usize,
}

impl HashEmbedder {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.embedding_dim];

        for (i, c) in text.to_lowercase().chars().enumerate() {
            let idx = (c as usize + i) % self.embedding_dim;
            embedding[idx] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dim(&self) -> usize {
        self.embedding_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_is_normalized() {
        let embedder = HashEmbedder::new(384);
        let embedding = embedder.embed("Hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("same text").await.unwrap();
        let b = embedder.embed("same text").await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_http_config_default() {
        let config = HttpEmbedderConfig::default();
        assert_eq!(config.embedding_dim, 384);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
