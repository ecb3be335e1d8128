//! Axum router configuration.
//!
//! `POST /webhook` is the receiver; `POST /` is kept as an alias so
//! webhooks configured against the bare host keep working.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// GitHub caps webhook payloads at 25 MB; axum's default limit is 2 MB.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handlers::webhook::receive_webhook))
        .route("/", post(handlers::webhook::receive_webhook))
        .route("/health", get(handlers::health::health))
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
