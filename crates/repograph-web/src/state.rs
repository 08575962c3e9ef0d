//! Application state.

use std::sync::Arc;

use repograph_graph::SyncPipeline;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SyncPipeline>,
    /// Shared secret for push-event signatures.
    pub secret: Arc<[u8]>,
    /// `owner/repo` being mirrored.
    pub repository: String,
}

impl AppState {
    pub fn new(pipeline: Arc<SyncPipeline>, secret: &str, repository: impl Into<String>) -> Self {
        Self {
            pipeline,
            secret: Arc::from(secret.as_bytes()),
            repository: repository.into(),
        }
    }
}
