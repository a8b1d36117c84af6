//! Catalog snapshot and loading
//!
//! The catalog is loaded once before serving begins and exposed as an
//! immutable snapshot. A reload builds a whole new snapshot and swaps the
//! handle atomically; in-flight queries keep reading the snapshot they
//! started with.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use support_agent_core::{Embedder, ResourceCategory, ResourceEntry};

use crate::SearchError;

/// Immutable view of the resource catalog
pub struct CatalogSnapshot {
    entries: Vec<ResourceEntry>,
    by_id: HashMap<String, usize>,
    category_counts: HashMap<ResourceCategory, usize>,
}

impl CatalogSnapshot {
    /// Build a snapshot, assigning insertion ordinals
    pub fn from_entries(mut entries: Vec<ResourceEntry>) -> Self {
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut category_counts: HashMap<ResourceCategory, usize> = HashMap::new();

        for (ordinal, entry) in entries.iter_mut().enumerate() {
            entry.ordinal = ordinal;
            by_id.insert(entry.id.clone(), ordinal);
            *category_counts.entry(entry.category).or_default() += 1;
        }

        Self {
            entries,
            by_id,
            category_counts,
        }
    }

    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&ResourceEntry> {
        self.by_id.get(id).map(|&ordinal| &self.entries[ordinal])
    }

    pub fn category_count(&self, category: ResourceCategory) -> usize {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }

    /// Whether a category hint can act as a hard filter
    pub fn has_category(&self, category: ResourceCategory) -> bool {
        self.category_count(category) > 0
    }
}

/// Shared handle to the current snapshot, swapped atomically on reload
#[derive(Clone)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

impl CatalogHandle {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Current snapshot. Cheap: clones an Arc, never the data.
    pub fn current(&self) -> Arc<CatalogSnapshot> {
        self.inner.read().clone()
    }

    /// Swap in a freshly built snapshot
    pub fn swap(&self, snapshot: CatalogSnapshot) {
        let mut guard = self.inner.write();
        *guard = Arc::new(snapshot);
        tracing::info!(entries = guard.len(), "Catalog snapshot swapped");
    }
}

/// Loads catalog entries from a JSON resource file
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load and validate entries. The file is a JSON array of resource
    /// records; ids must be unique and names non-empty.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<ResourceEntry>, SearchError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SearchError::Catalog(format!("failed to read {}: {}", path.display(), e))
        })?;

        let entries: Vec<ResourceEntry> = serde_json::from_str(&raw).map_err(|e| {
            SearchError::Catalog(format!("failed to parse {}: {}", path.display(), e))
        })?;

        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if entry.id.trim().is_empty() || entry.name.trim().is_empty() {
                return Err(SearchError::Catalog(format!(
                    "entry with empty id or name in {}",
                    path.display()
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(SearchError::Catalog(format!(
                    "duplicate resource id: {}",
                    entry.id
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            "Loaded resource catalog"
        );
        Ok(entries)
    }
}

/// Backfill missing embeddings through the provider.
///
/// Entries that already carry a vector of the right dimension are left
/// untouched. Returns the number of entries embedded. Runs during
/// ingestion only; once serving starts the catalog is read-only.
pub async fn backfill_embeddings(
    entries: &mut [ResourceEntry],
    embedder: &dyn Embedder,
) -> Result<usize, SearchError> {
    let mut embedded = 0usize;

    for entry in entries.iter_mut() {
        if entry.embedding.len() == embedder.dim() {
            continue;
        }
        let text = entry.embedding_text();
        let vector = embedder
            .embed(&text)
            .await
            .map_err(|e| SearchError::Embedding(format!("backfill for {}: {}", entry.id, e)))?;
        entry.embedding = vector;
        embedded += 1;
    }

    if embedded > 0 {
        tracing::info!(embedded, "Backfilled catalog embeddings");
    }
    Ok(embedded)
}
