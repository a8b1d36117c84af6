//! Result cache tiers
//!
//! Caches (query fingerprint -> ranked results) with bounded capacity,
//! TTL, and LRU eviction. A deployment can layer a shared remote tier
//! over the in-process tier; remote faults are absorbed and never surface
//! to callers.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use support_agent_core::RankedResult;

use crate::fingerprint::QueryFingerprint;
use crate::SearchError;

/// Cache tier statistics
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache tier interface
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(
        &self,
        fingerprint: &QueryFingerprint,
    ) -> Result<Option<Vec<RankedResult>>, SearchError>;

    async fn put(
        &self,
        fingerprint: &QueryFingerprint,
        results: &[RankedResult],
        ttl: Duration,
    ) -> Result<(), SearchError>;

    async fn invalidate(&self, fingerprint: &QueryFingerprint) -> Result<(), SearchError>;

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

struct StoredEntry {
    results: Vec<RankedResult>,
    created_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// In-process LRU cache with lazy TTL expiry.
///
/// Expiry is checked on `get`: an expired entry is treated as absent and
/// evicted on access, not proactively swept.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, StoredEntry>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let bounded = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(bounded)),
            capacity: bounded.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(
        &self,
        fingerprint: &QueryFingerprint,
    ) -> Result<Option<Vec<RankedResult>>, SearchError> {
        let mut entries = self.entries.lock();
        // LruCache::get promotes the entry, which doubles as the
        // last-access timestamp for eviction ordering.
        let expired = match entries.get(fingerprint.as_str()) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                let results = entry.results.clone();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(results));
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        };

        if expired {
            entries.pop(fingerprint.as_str());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn put(
        &self,
        fingerprint: &QueryFingerprint,
        results: &[RankedResult],
        ttl: Duration,
    ) -> Result<(), SearchError> {
        let entry = StoredEntry {
            results: results.to_vec(),
            created_at: Instant::now(),
            ttl,
        };
        // LruCache::push evicts the least-recently-used entry on overflow.
        self.entries.lock().push(fingerprint.as_str().to_string(), entry);
        Ok(())
    }

    async fn invalidate(&self, fingerprint: &QueryFingerprint) -> Result<(), SearchError> {
        self.entries.lock().pop(fingerprint.as_str());
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.lock().len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Shared remote cache tier speaking a JSON key-value protocol.
///
/// GET/PUT/DELETE `{endpoint}/cache/{fingerprint}`; values are serialized
/// ranked-result lists, TTL passed as a query parameter on writes.
pub struct HttpCache {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCache {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn url(&self, fingerprint: &QueryFingerprint) -> String {
        format!("{}/cache/{}", self.endpoint.trim_end_matches('/'), fingerprint)
    }
}

#[async_trait]
impl CacheStore for HttpCache {
    async fn get(
        &self,
        fingerprint: &QueryFingerprint,
    ) -> Result<Option<Vec<RankedResult>>, SearchError> {
        let response = self
            .client
            .get(self.url(fingerprint))
            .send()
            .await
            .map_err(|e| SearchError::Cache(format!("remote get failed: {}", e)))?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                match response.json::<Vec<RankedResult>>().await {
                    Ok(results) => Ok(Some(results)),
                    Err(e) => {
                        // A payload that no longer decodes is an invariant
                        // violation, not a routine miss. Surface it loudly
                        // and drop the poisoned entry.
                        tracing::error!(
                            fingerprint = %fingerprint,
                            error = %e,
                            "Cached payload failed to decode; invalidating entry"
                        );
                        let _ = self.client.delete(self.url(fingerprint)).send().await;
                        Err(SearchError::Cache(format!(
                            "cached payload failed to decode: {}",
                            e
                        )))
                    }
                }
            }
            status => Err(SearchError::Cache(format!(
                "remote get returned {}",
                status
            ))),
        }
    }

    async fn put(
        &self,
        fingerprint: &QueryFingerprint,
        results: &[RankedResult],
        ttl: Duration,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .put(self.url(fingerprint))
            .query(&[("ttl_secs", ttl.as_secs())])
            .json(results)
            .send()
            .await
            .map_err(|e| SearchError::Cache(format!("remote put failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SearchError::Cache(format!(
                "remote put returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn invalidate(&self, fingerprint: &QueryFingerprint) -> Result<(), SearchError> {
        self.client
            .delete(self.url(fingerprint))
            .send()
            .await
            .map_err(|e| SearchError::Cache(format!("remote delete failed: {}", e)))?;
        Ok(())
    }
}

/// Remote-over-local fallback decorator.
///
/// Reads try the remote tier first and fall back to the local tier on any
/// fault; writes always land locally and are mirrored to the remote tier
/// on a best-effort basis. A remote outage is never caller-visible.
pub struct TieredCache {
    remote: std::sync::Arc<dyn CacheStore>,
    local: std::sync::Arc<dyn CacheStore>,
    /// TTL used when repopulating the local tier from a remote hit
    local_ttl: Duration,
}

impl TieredCache {
    pub fn new(
        remote: std::sync::Arc<dyn CacheStore>,
        local: std::sync::Arc<dyn CacheStore>,
        local_ttl: Duration,
    ) -> Self {
        Self {
            remote,
            local,
            local_ttl,
        }
    }
}

#[async_trait]
impl CacheStore for TieredCache {
    async fn get(
        &self,
        fingerprint: &QueryFingerprint,
    ) -> Result<Option<Vec<RankedResult>>, SearchError> {
        match self.remote.get(fingerprint).await {
            Ok(Some(results)) => {
                if let Err(e) = self.local.put(fingerprint, &results, self.local_ttl).await {
                    tracing::debug!(error = %e, "Failed to repopulate local tier");
                }
                return Ok(Some(results));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Remote cache unavailable, using local tier");
            }
        }
        self.local.get(fingerprint).await
    }

    async fn put(
        &self,
        fingerprint: &QueryFingerprint,
        results: &[RankedResult],
        ttl: Duration,
    ) -> Result<(), SearchError> {
        if let Err(e) = self.remote.put(fingerprint, results, ttl).await {
            tracing::debug!(error = %e, "Remote cache write failed");
        }
        self.local.put(fingerprint, results, ttl).await
    }

    async fn invalidate(&self, fingerprint: &QueryFingerprint) -> Result<(), SearchError> {
        if let Err(e) = self.remote.invalidate(fingerprint).await {
            tracing::debug!(error = %e, "Remote cache invalidate failed");
        }
        self.local.invalidate(fingerprint).await
    }

    fn stats(&self) -> CacheStats {
        self.local.stats()
    }
}
