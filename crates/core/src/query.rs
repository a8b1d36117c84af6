//! Query and result types
//!
//! A `QueryRequest` is ephemeral, one per inbound call. Ranked results are
//! the unit stored in the cache tier, so they own their display fields
//! rather than borrowing from the catalog snapshot.

use serde::{Deserialize, Serialize};

use crate::resource::{ContactBlock, ResourceCategory, UrgencyLevel};

/// Default number of results returned when the caller does not ask
pub const DEFAULT_RESULT_LIMIT: usize = 3;
/// Hard ceiling on the result count
pub const MAX_RESULT_LIMIT: usize = 10;
/// Hard ceiling on conversation history length
pub const MAX_HISTORY_TURNS: usize = 10;
/// Hard ceiling on the utterance length
pub const MAX_MESSAGE_CHARS: usize = 500;

/// A single prior conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub utterance: String,
    pub intent: String,
}

fn default_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}

/// One incoming query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Raw user utterance
    pub message: String,
    /// Optional category hint from the front-end
    #[serde(default)]
    pub category: Option<ResourceCategory>,
    /// Optional urgency hint
    #[serde(default)]
    pub urgency: Option<UrgencyLevel>,
    /// Optional language hint
    #[serde(default)]
    pub language: Option<String>,
    /// Prior turns, most-recent-last
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    /// Result-count limit
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl QueryRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: None,
            urgency: None,
            language: None,
            history: Vec::new(),
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

/// Which filters and boosts applied to a ranked result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFlags {
    /// Entry supports the requested language
    pub language_matched: bool,
    /// Entry's urgency-served matches the urgency hint exactly
    pub urgency_matched: bool,
    /// Result set was produced under a hard category filter
    pub category_filtered: bool,
}

/// A scored catalog entry in a result list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub resource_id: String,
    pub name: String,
    pub description: String,
    pub category: ResourceCategory,
    pub urgency_served: UrgencyLevel,
    pub languages: Vec<String>,
    pub contact: ContactBlock,
    /// Similarity score in [0, 1] after boosts
    pub score: f32,
    pub flags: MatchFlags,
    /// Catalog insertion index, carried for stable tie-breaking
    #[serde(default)]
    pub ordinal: usize,
}

impl RankedResult {
    /// Ordering invariant: non-increasing score, ties broken by
    /// urgency-served (critical-serving first), then catalog ordinal.
    pub fn sort_results(results: &mut [RankedResult]) {
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.urgency_served.rank().cmp(&b.urgency_served.rank()))
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        });
    }
}

/// How a response was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    CacheHit,
    Computed,
    Emergency,
    Degraded,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::CacheHit => "cache_hit",
            SearchMethod::Computed => "computed",
            SearchMethod::Emergency => "emergency",
            SearchMethod::Degraded => "degraded",
        }
    }
}
