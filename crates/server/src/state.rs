//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use parking_lot::RwLock;

use support_agent_config::Settings;
use support_agent_search::{
    CatalogHandle, ContextAnalyzer, EmergencyHandler, HybridSearchEngine, IntentClassifier,
};

use crate::assembler::ResponseAssembler;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration, RwLock-wrapped for reload support
    pub config: Arc<RwLock<Settings>>,
    /// The search orchestrator
    pub engine: Arc<HybridSearchEngine>,
    /// Intent and urgency classifier
    pub classifier: Arc<IntentClassifier>,
    /// Hidden-need analyzer
    pub analyzer: Arc<ContextAnalyzer>,
    /// Emergency short-circuit path
    pub emergency: Arc<EmergencyHandler>,
    /// Response assembler
    pub assembler: Arc<ResponseAssembler>,
    /// Catalog snapshot handle
    pub catalog: CatalogHandle,
}

impl AppState {
    pub fn new(config: Settings, engine: Arc<HybridSearchEngine>, catalog: CatalogHandle) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            engine,
            classifier: Arc::new(IntentClassifier::new()),
            analyzer: Arc::new(ContextAnalyzer::new()),
            emergency: Arc::new(EmergencyHandler::new()),
            assembler: Arc::new(ResponseAssembler::new()),
            catalog,
        }
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
