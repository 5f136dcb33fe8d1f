pub mod api;
pub mod config;
pub mod error;
pub mod error_log;
pub mod generator;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod sanitizer;
pub mod scraper;
pub mod store;
pub mod validator;

use std::sync::Arc;
use std::time::Duration;

use pipeline::ClonePipeline;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ClonePipeline>,
    pub request_timeout: Duration,
    pub cors_origin: Option<String>,
}
