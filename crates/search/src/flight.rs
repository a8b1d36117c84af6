//! Per-key computation de-duplication
//!
//! Guarantees at most one concurrent computation per key: the first
//! caller to arrive runs the computation, concurrent callers for the same
//! key await the same result instead of recomputing. The entry is removed
//! once the computation completes (success or failure), so a later cache
//! expiry can trigger a fresh computation.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

/// Keyed single-flight table
pub struct FlightTable<T: Clone + Send + Sync> {
    inflight: DashMap<String, Arc<OnceCell<T>>>,
}

impl<T: Clone + Send + Sync> FlightTable<T> {
    pub fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Run `compute` under the key's single-flight guard.
    ///
    /// Exactly one caller initializes the cell; every concurrent caller
    /// for the same key awaits it and clones the shared result.
    pub async fn run<F, Fut>(&self, key: &str, compute: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = self
            .inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let value = cell.get_or_init(compute).await.clone();

        // Drop the entry only if it still maps to this flight; a newer
        // flight for the same key must not be torn down by a late waiter.
        self.inflight
            .remove_if(key, |_, current| Arc::ptr_eq(current, &cell));

        value
    }

    /// Number of computations currently in flight
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

impl<T: Clone + Send + Sync> Default for FlightTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_computation() {
        let table = Arc::new(FlightTable::<usize>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let table = Arc::clone(&table);
            let runs = Arc::clone(&runs);
            handles.push(tokio::spawn(async move {
                table
                    .run("same-key", || async {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        42
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_serialize() {
        let table = FlightTable::<&'static str>::new();
        let a = table.run("a", || async { "a" });
        let b = table.run("b", || async { "b" });
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a, "a");
        assert_eq!(b, "b");
    }

    #[tokio::test]
    async fn test_entry_removed_after_completion() {
        let table = FlightTable::<u32>::new();
        table.run("key", || async { 1 }).await;
        assert!(table.is_empty());

        // A later call computes afresh rather than observing a stale cell.
        let again = table.run("key", || async { 2 }).await;
        assert_eq!(again, 2);
    }
}
