//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use cachama_chat::ChatPipeline;
use cachama_core::config::CachamaConfig;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<CachamaConfig>,
    /// Retrieval + prompt + relay pipeline.
    pub pipeline: Arc<ChatPipeline>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: CachamaConfig, pipeline: ChatPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            start_time: Instant::now(),
        }
    }
}
