use std::sync::Arc;

use include_dir::Dir;
use tracing::error;

use crate::config::Config;
use crate::content::{ContentSource, SharedContent};
use crate::error::ApiError;

pub type SharedState = Arc<AppState>;

/// Everything a request handler needs. Built once, never mutated.
pub struct AppState {
    pub config: Arc<Config>,
    pub content: Arc<dyn ContentSource>,
    /// Embedded browser UI bundle.
    pub assets: &'static Dir<'static>,
}

impl AppState {
    pub fn new(
        config: Config,
        content: Arc<dyn ContentSource>,
        assets: &'static Dir<'static>,
    ) -> SharedState {
        Arc::new(Self {
            config: Arc::new(config),
            content,
            assets,
        })
    }

    /// Resolves a fresh snapshot off the async worker threads, since the
    /// filesystem calls block.
    pub async fn snapshot(&self) -> Result<SharedContent, ApiError> {
        let content = Arc::clone(&self.content);
        let config = Arc::clone(&self.config);

        tokio::task::spawn_blocking(move || content.resolve(&config))
            .await
            .map_err(|e| {
                error!(error = %e, "content resolution task failed");
                ApiError::internal("failed to resolve shared content")
            })
    }
}
