//! Core traits and types for the support agent
//!
//! This crate provides foundational types used across all other crates:
//! - Resource catalog types (categories, urgency tiers, entries)
//! - Query and result types
//! - Collaborator traits for pluggable backends (embedding, vector index)
//! - Error types

pub mod error;
pub mod query;
pub mod resource;
pub mod traits;

pub use error::{Error, Result};
pub use query::{
    HistoryTurn, MatchFlags, QueryRequest, RankedResult, SearchMethod, DEFAULT_RESULT_LIMIT,
    MAX_HISTORY_TURNS, MAX_MESSAGE_CHARS, MAX_RESULT_LIMIT,
};
pub use resource::{ContactBlock, ResourceCategory, ResourceEntry, UrgencyLevel};
pub use traits::{Embedder, IndexFilter, IndexHit, VectorIndex};
