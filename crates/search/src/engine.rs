//! Hybrid search engine
//!
//! Orchestrates fingerprinting, the cache tier, per-fingerprint
//! single-flight, embedding lookup, the vector index query, structured
//! filtering, and deterministic re-ranking. Dependency failures degrade
//! to an empty result set; this component never raises to its caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use support_agent_config::constants::{cache as cache_constants, search as search_constants};
use support_agent_config::Settings;
use support_agent_core::{
    Embedder, IndexFilter, IndexHit, MatchFlags, QueryRequest, RankedResult, SearchMethod,
    VectorIndex, MAX_RESULT_LIMIT,
};

use crate::cache::CacheStore;
use crate::catalog::{CatalogHandle, CatalogSnapshot};
use crate::fingerprint::{normalize_message, QueryFingerprint};
use crate::flight::FlightTable;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Candidates fetched from the index per requested result
    pub candidate_factor: usize,
    /// Score boost per matched language
    pub language_boost: f32,
    /// Score boost for an exact urgency-served match
    pub urgency_boost: f32,
    /// Total boost cap, so boosts never invert a larger similarity gap
    pub boost_cap: f32,
    /// Deadline for one embedding call
    pub embed_timeout: Duration,
    /// Deadline for one index query
    pub index_timeout: Duration,
    /// TTL for cached results
    pub cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_factor: search_constants::CANDIDATE_FACTOR,
            language_boost: search_constants::LANGUAGE_BOOST,
            urgency_boost: search_constants::URGENCY_BOOST,
            boost_cap: search_constants::BOOST_CAP,
            embed_timeout: Duration::from_millis(search_constants::EMBED_TIMEOUT_MS),
            index_timeout: Duration::from_millis(search_constants::INDEX_TIMEOUT_MS),
            cache_ttl: Duration::from_secs(cache_constants::DEFAULT_TTL_SECS),
        }
    }
}

impl From<&Settings> for EngineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            embed_timeout: Duration::from_millis(settings.search.embed_timeout_ms),
            index_timeout: Duration::from_millis(settings.search.index_timeout_ms),
            cache_ttl: Duration::from_secs(settings.cache.ttl_secs),
            ..Self::default()
        }
    }
}

/// What one search produced
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<RankedResult>,
    pub method: SearchMethod,
    pub cache_hit: bool,
    /// Category hint was dropped because the catalog has no such entries
    pub category_fallback: bool,
}

/// Result of one fingerprint computation, shared across concurrent
/// callers through the flight table.
#[derive(Debug, Clone)]
struct Computation {
    results: Vec<RankedResult>,
    method: SearchMethod,
    category_fallback: bool,
}

impl Computation {
    fn degraded(category_fallback: bool) -> Self {
        Self {
            results: Vec::new(),
            method: SearchMethod::Degraded,
            category_fallback,
        }
    }
}

/// The central search orchestrator
pub struct HybridSearchEngine {
    config: EngineConfig,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    cache: Arc<dyn CacheStore>,
    catalog: CatalogHandle,
    flights: FlightTable<Computation>,
}

impl HybridSearchEngine {
    pub fn new(
        config: EngineConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        cache: Arc<dyn CacheStore>,
        catalog: CatalogHandle,
    ) -> Self {
        Self {
            config,
            embedder,
            index,
            cache,
            catalog,
            flights: FlightTable::new(),
        }
    }

    /// Run one query.
    ///
    /// A cache hit returns immediately and is not revalidated against the
    /// catalog; staleness is bounded only by the TTL. On a miss, at most
    /// one computation runs per fingerprint: concurrent callers for the
    /// same fingerprint await the first caller's result.
    pub async fn search(&self, request: &QueryRequest) -> SearchOutcome {
        let fingerprint = QueryFingerprint::compute(request);

        match self.cache.get(&fingerprint).await {
            Ok(Some(results)) => {
                tracing::debug!(fingerprint = %fingerprint, "Cache hit");
                return SearchOutcome {
                    results,
                    method: SearchMethod::CacheHit,
                    cache_hit: true,
                    category_fallback: false,
                };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Cache read failed, treating as miss");
            }
        }

        let computation = self
            .flights
            .run(fingerprint.as_str(), || {
                self.compute(request, &fingerprint)
            })
            .await;

        SearchOutcome {
            results: computation.results,
            method: computation.method,
            cache_hit: false,
            category_fallback: computation.category_fallback,
        }
    }

    /// The expensive path: embed, query the index, re-rank, cache.
    async fn compute(
        &self,
        request: &QueryRequest,
        fingerprint: &QueryFingerprint,
    ) -> Computation {
        // Re-check under the flight guard: a caller that raced past the
        // outer cache check may start a fresh flight just after the
        // in-flight computation completed and cached its result.
        if let Ok(Some(results)) = self.cache.get(fingerprint).await {
            return Computation {
                results,
                method: SearchMethod::Computed,
                category_fallback: false,
            };
        }

        let snapshot = self.catalog.current();
        if snapshot.is_empty() {
            tracing::warn!("Catalog is empty, degrading");
            return Computation::degraded(false);
        }

        let normalized = normalize_message(&request.message);
        let vector = match timeout(self.config.embed_timeout, self.embedder.embed(&normalized))
            .await
        {
            Ok(Ok(vector)) => vector,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Embedding provider failed, degrading");
                return Computation::degraded(false);
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.embed_timeout.as_millis() as u64,
                    "Embedding deadline exceeded, degrading"
                );
                return Computation::degraded(false);
            }
        };

        // Category hint is a hard filter only when the catalog can
        // actually satisfy it; an unsatisfiable hint is dropped so the
        // request never returns zero results because of it.
        let (filter, category_fallback) = match request.category {
            Some(category) if snapshot.has_category(category) => {
                (Some(IndexFilter::category(category)), false)
            }
            Some(category) => {
                tracing::debug!(category = %category, "Category hint has no catalog entries, ignoring");
                (None, true)
            }
            None => (None, false),
        };
        let category_filtered = filter.is_some();

        let limit = request.limit.clamp(1, MAX_RESULT_LIMIT);
        let k = limit.saturating_mul(self.config.candidate_factor).max(limit);

        let hits = match timeout(
            self.config.index_timeout,
            self.index.query(&vector, filter, k),
        )
        .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Vector index failed, degrading");
                return Computation::degraded(category_fallback);
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.index_timeout.as_millis() as u64,
                    "Index deadline exceeded, degrading"
                );
                return Computation::degraded(category_fallback);
            }
        };

        let mut results = self.rank(&snapshot, hits, request, category_filtered);
        results.truncate(limit);

        // Degraded outcomes never reach this point, so only real result
        // sets enter the cache.
        if let Err(e) = self
            .cache
            .put(fingerprint, &results, self.config.cache_ttl)
            .await
        {
            tracing::warn!(fingerprint = %fingerprint, error = %e, "Cache write failed");
        }

        Computation {
            results,
            method: SearchMethod::Computed,
            category_fallback,
        }
    }

    /// Materialize hits against the snapshot and apply deterministic
    /// boosts: +language_boost per matched language, +urgency_boost for an
    /// exact urgency-served match, total capped at boost_cap.
    fn rank(
        &self,
        snapshot: &CatalogSnapshot,
        hits: Vec<IndexHit>,
        request: &QueryRequest,
        category_filtered: bool,
    ) -> Vec<RankedResult> {
        let mut results = Vec::with_capacity(hits.len());

        for hit in hits {
            let Some(entry) = snapshot.get(&hit.resource_id) else {
                tracing::debug!(resource_id = %hit.resource_id, "Index hit not in snapshot, skipping");
                continue;
            };

            let language_matched = request
                .language
                .as_deref()
                .map_or(false, |language| entry.supports_language(language));
            let urgency_matched = request
                .urgency
                .map_or(false, |urgency| entry.urgency_served == urgency);

            let mut boost = 0.0f32;
            if language_matched {
                boost += self.config.language_boost;
            }
            if urgency_matched {
                boost += self.config.urgency_boost;
            }
            let boost = boost.min(self.config.boost_cap);

            results.push(RankedResult {
                resource_id: entry.id.clone(),
                name: entry.name.clone(),
                description: entry.description.clone(),
                category: entry.category,
                urgency_served: entry.urgency_served,
                languages: entry.languages.clone(),
                contact: entry.contact.clone(),
                score: (hit.score + boost).clamp(0.0, 1.0),
                flags: MatchFlags {
                    language_matched,
                    urgency_matched,
                    category_filtered,
                },
                ordinal: entry.ordinal,
            });
        }

        RankedResult::sort_results(&mut results);
        results
    }

    /// Invalidate one cached fingerprint
    pub async fn invalidate(&self, fingerprint: &QueryFingerprint) {
        if let Err(e) = self.cache.invalidate(fingerprint).await {
            tracing::warn!(fingerprint = %fingerprint, error = %e, "Cache invalidate failed");
        }
    }

    /// Cache tier statistics for health reporting
    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.cache.stats()
    }

    /// Current catalog snapshot handle
    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::catalog::CatalogSnapshot;
    use async_trait::async_trait;
    use support_agent_core::{Error, ResourceCategory, ResourceEntry, UrgencyLevel};

    /// Index returning a fixed hit list
    struct FixedIndex {
        hits: Vec<IndexHit>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn query(
            &self,
            _: &[f32],
            _: Option<IndexFilter>,
            _: usize,
        ) -> support_agent_core::Result<Vec<IndexHit>> {
            Ok(self.hits.clone())
        }
    }

    struct FailingIndex;

    #[async_trait]
    impl VectorIndex for FailingIndex {
        async fn query(
            &self,
            _: &[f32],
            _: Option<IndexFilter>,
            _: usize,
        ) -> support_agent_core::Result<Vec<IndexHit>> {
            Err(Error::Index("index down".to_string()))
        }
    }

    fn entry(
        id: &str,
        category: ResourceCategory,
        urgency: UrgencyLevel,
        languages: &[&str],
    ) -> ResourceEntry {
        ResourceEntry {
            id: id.to_string(),
            name: id.to_string(),
            description: format!("{} service", id),
            category,
            urgency_served: urgency,
            languages: languages.iter().map(|l| l.to_string()).collect(),
            cost: "Free".to_string(),
            contact: Default::default(),
            keywords: vec![],
            embedding: vec![1.0, 0.0],
            ordinal: 0,
        }
    }

    fn engine_with(hits: Vec<IndexHit>, entries: Vec<ResourceEntry>) -> HybridSearchEngine {
        HybridSearchEngine::new(
            EngineConfig::default(),
            Arc::new(crate::embeddings::HashEmbedder::new(8)),
            Arc::new(FixedIndex { hits }),
            Arc::new(MemoryCache::new(16)),
            CatalogHandle::new(CatalogSnapshot::from_entries(entries)),
        )
    }

    fn hit(id: &str, score: f32) -> IndexHit {
        IndexHit {
            resource_id: id.to_string(),
            score,
        }
    }

    #[tokio::test]
    async fn test_scores_non_increasing() {
        let engine = engine_with(
            vec![hit("a", 0.4), hit("b", 0.9), hit("c", 0.7)],
            vec![
                entry("a", ResourceCategory::Housing, UrgencyLevel::Standard, &["English"]),
                entry("b", ResourceCategory::Housing, UrgencyLevel::Standard, &["English"]),
                entry("c", ResourceCategory::Housing, UrgencyLevel::Standard, &["English"]),
            ],
        );

        let outcome = engine.search(&QueryRequest::new("housing help")).await;
        assert_eq!(outcome.method, SearchMethod::Computed);
        for pair in outcome.results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_language_boost_applied_and_flagged() {
        let mut request = QueryRequest::new("doctor");
        request.language = Some("Arabic".to_string());

        let engine = engine_with(
            vec![hit("english-only", 0.80), hit("arabic", 0.78)],
            vec![
                entry(
                    "english-only",
                    ResourceCategory::Healthcare,
                    UrgencyLevel::Standard,
                    &["English"],
                ),
                entry(
                    "arabic",
                    ResourceCategory::Healthcare,
                    UrgencyLevel::Standard,
                    &["English", "Arabic"],
                ),
            ],
        );

        let outcome = engine.search(&request).await;
        // 0.78 + 0.05 boost beats 0.80.
        assert_eq!(outcome.results[0].resource_id, "arabic");
        assert!(outcome.results[0].flags.language_matched);
        assert!(!outcome.results[1].flags.language_matched);
    }

    #[tokio::test]
    async fn test_boost_cannot_invert_large_gap() {
        let mut request = QueryRequest::new("doctor");
        request.language = Some("Arabic".to_string());
        request.urgency = Some(UrgencyLevel::High);

        let engine = engine_with(
            vec![hit("strong", 0.90), hit("boosted", 0.70)],
            vec![
                entry("strong", ResourceCategory::Healthcare, UrgencyLevel::Standard, &["English"]),
                entry("boosted", ResourceCategory::Healthcare, UrgencyLevel::High, &["Arabic"]),
            ],
        );

        let outcome = engine.search(&request).await;
        // Max boost (0.08) is below the 0.20 gap: ordering holds.
        assert_eq!(outcome.results[0].resource_id, "strong");
    }

    #[tokio::test]
    async fn test_category_hint_without_matches_sets_fallback() {
        let mut request = QueryRequest::new("I need advice");
        request.category = Some(ResourceCategory::Legal);

        let engine = engine_with(
            vec![hit("a", 0.5)],
            vec![entry("a", ResourceCategory::Housing, UrgencyLevel::Standard, &["English"])],
        );

        let outcome = engine.search(&request).await;
        assert!(outcome.category_fallback);
        assert_eq!(outcome.method, SearchMethod::Computed);
        assert!(!outcome.results.is_empty());
        assert!(!outcome.results[0].flags.category_filtered);
    }

    #[tokio::test]
    async fn test_index_failure_degrades() {
        let engine = HybridSearchEngine::new(
            EngineConfig::default(),
            Arc::new(crate::embeddings::HashEmbedder::new(8)),
            Arc::new(FailingIndex),
            Arc::new(MemoryCache::new(16)),
            CatalogHandle::new(CatalogSnapshot::from_entries(vec![entry(
                "a",
                ResourceCategory::Housing,
                UrgencyLevel::Standard,
                &["English"],
            )])),
        );

        let outcome = engine.search(&QueryRequest::new("anything")).await;
        assert_eq!(outcome.method, SearchMethod::Degraded);
        assert!(outcome.results.is_empty());
        assert!(!outcome.cache_hit);
    }

    #[tokio::test]
    async fn test_empty_catalog_degrades() {
        let engine = engine_with(vec![], vec![]);
        let outcome = engine.search(&QueryRequest::new("anything")).await;
        assert_eq!(outcome.method, SearchMethod::Degraded);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_outcome_not_cached() {
        let engine = HybridSearchEngine::new(
            EngineConfig::default(),
            Arc::new(crate::embeddings::HashEmbedder::new(8)),
            Arc::new(FailingIndex),
            Arc::new(MemoryCache::new(16)),
            CatalogHandle::new(CatalogSnapshot::from_entries(vec![entry(
                "a",
                ResourceCategory::Housing,
                UrgencyLevel::Standard,
                &["English"],
            )])),
        );

        let request = QueryRequest::new("anything");
        let first = engine.search(&request).await;
        let second = engine.search(&request).await;
        assert_eq!(first.method, SearchMethod::Degraded);
        // A degraded response must not be served from cache afterwards.
        assert_eq!(second.method, SearchMethod::Degraded);
        assert!(!second.cache_hit);
    }

    #[tokio::test]
    async fn test_limit_truncates_results() {
        let mut request = QueryRequest::new("housing");
        request.limit = 2;

        let engine = engine_with(
            vec![hit("a", 0.9), hit("b", 0.8), hit("c", 0.7)],
            vec![
                entry("a", ResourceCategory::Housing, UrgencyLevel::Standard, &["English"]),
                entry("b", ResourceCategory::Housing, UrgencyLevel::Standard, &["English"]),
                entry("c", ResourceCategory::Housing, UrgencyLevel::Standard, &["English"]),
            ],
        );

        let outcome = engine.search(&request).await;
        assert_eq!(outcome.results.len(), 2);
    }
}
