use std::sync::Arc;

use crate::engine::Engine;
use crate::queue::IngestQueue;

/// Shared handler state, grounded on `wkmp-ap`'s `Arc<AppState>` +
/// `axum::Router::with_state` pattern.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub queue: Arc<IngestQueue>,
}
