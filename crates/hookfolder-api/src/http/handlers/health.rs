use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health - liveness, pending job count and the active folder store.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "live_jobs": state.scheduler.live_count(),
        "store": state.provisioner.store().kind(),
    }))
}
