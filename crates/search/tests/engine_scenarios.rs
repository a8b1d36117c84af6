//! End-to-end scenarios for the search core
//!
//! Exercises the engine against counting collaborator fakes so the cache
//! coherence and emergency bypass guarantees can be asserted as call
//! counts, not just return values.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use support_agent_core::{
    Embedder, Error, IndexFilter, IndexHit, QueryRequest, ResourceCategory, ResourceEntry,
    SearchMethod, UrgencyLevel, VectorIndex,
};
use support_agent_search::{
    backfill_embeddings, CatalogHandle, CatalogSnapshot, EmergencyHandler, EngineConfig,
    HashEmbedder, HybridSearchEngine, IntentClassifier, MemoryCache, MemoryIndex,
};

const DIM: usize = 32;

/// Embedder that counts calls
struct CountingEmbedder {
    inner: HashEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Self {
        Self {
            inner: HashEmbedder::new(DIM),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> support_agent_core::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent callers genuinely overlap inside the
        // single-flight window.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.inner.embed(text).await
    }

    fn dim(&self) -> usize {
        DIM
    }
}

/// Index that counts calls and delegates to the in-memory index
struct CountingIndex {
    inner: MemoryIndex,
    calls: AtomicUsize,
}

impl CountingIndex {
    fn new(catalog: CatalogHandle) -> Self {
        Self {
            inner: MemoryIndex::new(catalog),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for CountingIndex {
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<IndexFilter>,
        k: usize,
    ) -> support_agent_core::Result<Vec<IndexHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.query(vector, filter, k).await
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
        Err(Error::Index("index unavailable".to_string()))
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _: &str) -> support_agent_core::Result<Vec<f32>> {
        Err(Error::Embedding("provider unavailable".to_string()))
    }

    fn dim(&self) -> usize {
        DIM
    }
}

fn entry(
    id: &str,
    name: &str,
    description: &str,
    category: ResourceCategory,
    urgency: UrgencyLevel,
) -> ResourceEntry {
    ResourceEntry {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        urgency_served: urgency,
        languages: vec!["English".to_string()],
        cost: "Free".to_string(),
        contact: Default::default(),
        keywords: vec![],
        embedding: vec![],
        ordinal: 0,
    }
}

async fn fixture_catalog() -> CatalogHandle {
    let mut entries = vec![
        entry(
            "housing-first-base",
            "OneLink ACT",
            "Central intake for homelessness and accommodation support services",
            ResourceCategory::Housing,
            UrgencyLevel::High,
        ),
        entry(
            "housing-tenancy",
            "Tenancy Advice Service",
            "Advice on rent, leases and eviction for tenants",
            ResourceCategory::Housing,
            UrgencyLevel::Standard,
        ),
        entry(
            "health-walkin",
            "Walk-in Centre",
            "Free health care for minor illness and injury, no appointment",
            ResourceCategory::Healthcare,
            UrgencyLevel::Standard,
        ),
        entry(
            "employment-services",
            "Workforce Australia",
            "Employment services, job search and training support",
            ResourceCategory::Employment,
            UrgencyLevel::Standard,
        ),
    ];

    let embedder = HashEmbedder::new(DIM);
    backfill_embeddings(&mut entries, &embedder).await.unwrap();
    CatalogHandle::new(CatalogSnapshot::from_entries(entries))
}

struct Fixture {
    engine: Arc<HybridSearchEngine>,
    embedder: Arc<CountingEmbedder>,
    index: Arc<CountingIndex>,
}

async fn fixture() -> Fixture {
    let catalog = fixture_catalog().await;
    let embedder = Arc::new(CountingEmbedder::new());
    let index = Arc::new(CountingIndex::new(catalog.clone()));
    let engine = Arc::new(HybridSearchEngine::new(
        EngineConfig::default(),
        embedder.clone(),
        index.clone(),
        Arc::new(MemoryCache::new(64)),
        catalog,
    ));
    Fixture {
        engine,
        embedder,
        index,
    }
}

#[tokio::test]
async fn test_basic_housing_query() {
    let fixture = fixture().await;
    let classifier = IntentClassifier::new();

    let classification = classifier.classify("I need help finding accommodation");
    assert_eq!(classification.intent, ResourceCategory::Housing);
    assert_eq!(classification.urgency, UrgencyLevel::Standard);

    let outcome = fixture
        .engine
        .search(&QueryRequest::new("I need help finding accommodation"))
        .await;
    assert!(!outcome.results.is_empty());
    assert!(matches!(
        outcome.method,
        SearchMethod::Computed | SearchMethod::CacheHit
    ));
}

#[tokio::test]
async fn test_repeated_query_hits_cache() {
    let fixture = fixture().await;
    let request = QueryRequest::new("where can I rent a house");

    let first = fixture.engine.search(&request).await;
    assert!(!first.cache_hit);
    assert_eq!(first.method, SearchMethod::Computed);

    let second = fixture.engine.search(&request).await;
    assert!(second.cache_hit);
    assert_eq!(second.method, SearchMethod::CacheHit);

    let first_ids: Vec<_> = first.results.iter().map(|r| &r.resource_id).collect();
    let second_ids: Vec<_> = second.results.iter().map(|r| &r.resource_id).collect();
    assert_eq!(first_ids, second_ids);

    // The second call must not touch either collaborator.
    assert_eq!(fixture.embedder.calls(), 1);
    assert_eq!(fixture.index.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_queries_compute_once() {
    let fixture = fixture().await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let engine = Arc::clone(&fixture.engine);
        handles.push(tokio::spawn(async move {
            engine.search(&QueryRequest::new("help with housing")).await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    // One expensive computation total: everyone else waited on it or hit
    // the cache it populated.
    assert_eq!(fixture.embedder.calls(), 1);
    assert_eq!(fixture.index.calls(), 1);

    let reference: Vec<_> = outcomes[0]
        .results
        .iter()
        .map(|r| r.resource_id.clone())
        .collect();
    for outcome in &outcomes {
        let ids: Vec<_> = outcome.results.iter().map(|r| r.resource_id.clone()).collect();
        assert_eq!(ids, reference);
    }
}

#[tokio::test]
async fn test_distinct_fingerprints_compute_separately() {
    let fixture = fixture().await;

    fixture.engine.search(&QueryRequest::new("housing")).await;
    fixture.engine.search(&QueryRequest::new("a doctor")).await;

    assert_eq!(fixture.embedder.calls(), 2);
    assert_eq!(fixture.index.calls(), 2);
}

#[tokio::test]
async fn test_ranking_order_invariant() {
    let fixture = fixture().await;
    let mut request = QueryRequest::new("support services near me");
    request.limit = 4;

    let outcome = fixture.engine.search(&request).await;
    for pair in outcome.results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
        if (pair[0].score - pair[1].score).abs() < f32::EPSILON {
            assert!(pair[0].urgency_served.rank() <= pair[1].urgency_served.rank());
        }
    }
}

#[tokio::test]
async fn test_index_failure_yields_degraded_not_error() {
    let catalog = fixture_catalog().await;
    let engine = HybridSearchEngine::new(
        EngineConfig::default(),
        Arc::new(HashEmbedder::new(DIM)),
        Arc::new(FailingIndex),
        Arc::new(MemoryCache::new(16)),
        catalog,
    );

    let outcome = engine.search(&QueryRequest::new("anything at all")).await;
    assert_eq!(outcome.method, SearchMethod::Degraded);
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn test_embedder_failure_yields_degraded_not_error() {
    let catalog = fixture_catalog().await;
    let engine = HybridSearchEngine::new(
        EngineConfig::default(),
        Arc::new(FailingEmbedder),
        Arc::new(MemoryIndex::new(catalog.clone())),
        Arc::new(MemoryCache::new(16)),
        catalog,
    );

    let outcome = engine.search(&QueryRequest::new("anything at all")).await;
    assert_eq!(outcome.method, SearchMethod::Degraded);
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn test_category_hint_with_no_matches_falls_back() {
    let fixture = fixture().await;
    let mut request = QueryRequest::new("I need advice about my rights");
    // No legal entries in the fixture catalog.
    request.category = Some(ResourceCategory::Legal);

    let outcome = fixture.engine.search(&request).await;
    assert!(outcome.category_fallback);
    assert!(!outcome.results.is_empty());
    assert!(outcome.results.iter().all(|r| !r.flags.category_filtered));
}

#[tokio::test]
async fn test_category_hint_with_matches_filters_hard() {
    let fixture = fixture().await;
    let mut request = QueryRequest::new("help me");
    request.category = Some(ResourceCategory::Housing);

    let outcome = fixture.engine.search(&request).await;
    assert!(!outcome.category_fallback);
    assert!(!outcome.results.is_empty());
    assert!(outcome
        .results
        .iter()
        .all(|r| r.category == ResourceCategory::Housing));
    assert!(outcome.results.iter().all(|r| r.flags.category_filtered));
}

#[tokio::test]
async fn test_emergency_bypass_makes_zero_collaborator_calls() {
    let fixture = fixture().await;
    let classifier = IntentClassifier::new();
    let handler = EmergencyHandler::new();

    let message = "I need urgent help now, crisis";
    let classification = classifier.classify(message);
    assert_eq!(classification.urgency, UrgencyLevel::Critical);

    // Critical urgency routes to the handler; the engine is never
    // consulted, so neither collaborator sees a call.
    let results = handler.handle(message);
    assert!(!results.is_empty());
    assert_eq!(results[0].resource_id, "emergency-000");
    assert_eq!(fixture.embedder.calls(), 0);
    assert_eq!(fixture.index.calls(), 0);

    // The fixed list is independent of catalog state.
    let again = handler.handle(message);
    let ids: Vec<_> = results.iter().map(|r| &r.resource_id).collect();
    let again_ids: Vec<_> = again.iter().map(|r| &r.resource_id).collect();
    assert_eq!(ids, again_ids);
}
