//! Prometheus metrics
//!
//! Request and cache counters exposed at /metrics.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Safe to call once at startup.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_counter!(
                "support_agent_requests_total",
                "Requests handled, labeled by resolution method"
            );
            describe_counter!(
                "support_agent_cache_hits_total",
                "Search cache hits and misses"
            );
            let _ = HANDLE.set(handle);
            HANDLE.get()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install metrics recorder");
            None
        }
    }
}

/// Count one handled request by resolution method
pub fn record_request(method: &str) {
    counter!("support_agent_requests_total", "method" => method.to_string()).increment(1);
}

/// Count a cache hit or miss
pub fn record_cache_hit(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("support_agent_cache_hits_total", "outcome" => outcome).increment(1);
}

/// Prometheus exposition endpoint
pub async fn metrics_handler() -> String {
    HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
