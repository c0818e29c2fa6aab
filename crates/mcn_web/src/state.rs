use mcn_ingest::FeedManager;
use std::sync::Arc;

pub struct AppState {
    pub manager: Arc<FeedManager>,
}

impl AppState {
    pub fn new(manager: Arc<FeedManager>) -> Self {
        Self { manager }
    }
}
