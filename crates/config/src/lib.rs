//! Configuration management for the support agent
//!
//! Supports loading configuration from:
//! - YAML files (config/default.yaml, config/{env}.yaml)
//! - Environment variables (SUPPORT_AGENT__ prefix)
//!
//! All tunables flow through `Settings`; fixed algorithm parameters live
//! in the `constants` module.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, CacheConfig, CatalogConfig, ObservabilityConfig, RuntimeEnvironment,
    SearchConfig, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
