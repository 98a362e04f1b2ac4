//! Application state shared across handlers

use std::sync::Arc;

use application::VoicePipelineService;
use infrastructure::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Rate limiting, provider routing and object cleanup
    pub pipeline: Arc<VoicePipelineService>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(pipeline: VoicePipelineService, config: AppConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }
}
