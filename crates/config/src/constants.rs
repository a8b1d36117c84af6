//! Centralized constants
//!
//! Fixed algorithm parameters live here rather than in `Settings` so the
//! ranking behavior stays identical across deployments.

/// Default service endpoints
pub mod endpoints {
    /// Default Qdrant endpoint
    pub const QDRANT_DEFAULT: &str = "http://localhost:6334";
    /// Default embedding API endpoint
    pub const EMBED_DEFAULT: &str = "http://localhost:11434";
}

/// Search and ranking parameters
pub mod search {
    /// Default result count
    pub const DEFAULT_TOP_K: usize = 3;
    /// Maximum result count a caller may request
    pub const MAX_TOP_K: usize = 10;
    /// Candidates fetched from the index per requested result, so that
    /// re-ranking has room to reorder
    pub const CANDIDATE_FACTOR: usize = 3;
    /// Score boost per matched language
    pub const LANGUAGE_BOOST: f32 = 0.05;
    /// Score boost for an exact urgency-served match
    pub const URGENCY_BOOST: f32 = 0.03;
    /// Total boost cap. A boost can never invert a similarity gap larger
    /// than this.
    pub const BOOST_CAP: f32 = 0.15;
    /// Deadline for one embedding call
    pub const EMBED_TIMEOUT_MS: u64 = 3_000;
    /// Deadline for one index query
    pub const INDEX_TIMEOUT_MS: u64 = 3_000;
}

/// Cache tier parameters
pub mod cache {
    /// Default in-process entry capacity
    pub const DEFAULT_CAPACITY: usize = 500;
    /// Default TTL for cached search results (seconds)
    pub const DEFAULT_TTL_SECS: u64 = 1_800;
    /// Deadline for one remote cache round trip
    pub const REMOTE_TIMEOUT_MS: u64 = 500;
}
