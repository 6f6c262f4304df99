use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Builds the full route table of `SPEC_FULL.md` §6, grounded on
/// `wkmp-ap`'s `Router::new().route(...).with_state(...)` layering.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/ingest", post(handlers::ingest))
        .route("/api/recognize", post(handlers::recognize))
        .route("/api/stats", get(handlers::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
