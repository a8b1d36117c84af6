//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{cache, endpoints, search};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Search engine configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Cache tier configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Catalog source configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enable CORS restrictions; when false a permissive layer is used
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins; empty defaults to localhost
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Search engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Use Qdrant as the vector index; when false the engine runs against
    /// the in-process brute-force index over the catalog snapshot
    #[serde(default)]
    pub qdrant_enabled: bool,
    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,
    #[serde(default = "default_qdrant_collection")]
    pub qdrant_collection: String,
    #[serde(default)]
    pub qdrant_api_key: Option<String>,
    /// Embedding vector dimension
    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,
    /// Embedding API endpoint
    #[serde(default = "default_embed_endpoint")]
    pub embed_endpoint: String,
    /// Embedding model name
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    /// Deadline for one embedding call (milliseconds)
    #[serde(default = "default_embed_timeout_ms")]
    pub embed_timeout_ms: u64,
    /// Deadline for one index query (milliseconds)
    #[serde(default = "default_index_timeout_ms")]
    pub index_timeout_ms: u64,
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}

fn default_qdrant_collection() -> String {
    "support_resources".to_string()
}

fn default_vector_dim() -> usize {
    384
}

fn default_embed_endpoint() -> String {
    endpoints::EMBED_DEFAULT.to_string()
}

fn default_embed_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embed_timeout_ms() -> u64 {
    search::EMBED_TIMEOUT_MS
}

fn default_index_timeout_ms() -> u64 {
    search::INDEX_TIMEOUT_MS
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            qdrant_enabled: false,
            qdrant_endpoint: default_qdrant_endpoint(),
            qdrant_collection: default_qdrant_collection(),
            qdrant_api_key: None,
            vector_dim: default_vector_dim(),
            embed_endpoint: default_embed_endpoint(),
            embed_model: default_embed_model(),
            embed_timeout_ms: default_embed_timeout_ms(),
            index_timeout_ms: default_index_timeout_ms(),
        }
    }
}

/// Cache tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// In-process entry capacity (LRU)
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// TTL for cached results (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    /// Enable the shared remote tier
    #[serde(default)]
    pub remote_enabled: bool,
    /// Remote tier endpoint
    #[serde(default)]
    pub remote_endpoint: Option<String>,
    /// Deadline for one remote round trip (milliseconds)
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,
}

fn default_cache_capacity() -> usize {
    cache::DEFAULT_CAPACITY
}

fn default_cache_ttl_secs() -> u64 {
    cache::DEFAULT_TTL_SECS
}

fn default_remote_timeout_ms() -> u64 {
    cache::REMOTE_TIMEOUT_MS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
            remote_enabled: false,
            remote_endpoint: None,
            remote_timeout_ms: default_remote_timeout_ms(),
        }
    }
}

/// Catalog source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the resource catalog JSON file
    #[serde(default = "default_catalog_path")]
    pub path: String,
    /// Backfill missing embeddings through the provider at startup
    #[serde(default = "default_true")]
    pub backfill_embeddings: bool,
}

fn default_catalog_path() -> String {
    "data/resources.json".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            backfill_embeddings: true,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON-formatted logs
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings before serving starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.vector_dim == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.vector_dim".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        for (field, value) in [
            ("search.embed_timeout_ms", self.search.embed_timeout_ms),
            ("search.index_timeout_ms", self.search.index_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Deadline must be non-zero".to_string(),
                });
            }
            if value > 10_000 {
                tracing::warn!(field, value, "External-call deadline is unusually long");
            }
        }

        if self.cache.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.capacity".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs".to_string(),
                message: "Must be non-zero".to_string(),
            });
        }

        if self.cache.remote_enabled && self.cache.remote_endpoint.is_none() {
            return Err(ConfigError::MissingField(
                "cache.remote_endpoint".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load settings from files and environment.
///
/// Priority: env vars > config/{env}.yaml > config/default.yaml > defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder().add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    let config = builder
        .add_source(Environment::with_prefix("SUPPORT_AGENT").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut settings = Settings::default();
        settings.cache.ttl_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_remote_enabled_requires_endpoint() {
        let mut settings = Settings::default();
        settings.cache.remote_enabled = true;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingField(_))
        ));

        settings.cache.remote_endpoint = Some("http://cache:9000".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let mut settings = Settings::default();
        settings.search.embed_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }
}
