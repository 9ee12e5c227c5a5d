//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedOverlayClient;
use crate::config::AppConfig;
use crate::fetch::FeedClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// GTFS archive client
    pub feed: Arc<FeedClient>,

    /// Cached rail overlay client
    pub overlay: Arc<CachedOverlayClient>,

    /// Request defaults and output naming
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(feed: FeedClient, overlay: CachedOverlayClient, config: AppConfig) -> Self {
        Self {
            feed: Arc::new(feed),
            overlay: Arc::new(overlay),
            config: Arc::new(config),
        }
    }
}
