//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /health - no auth required.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let status = if state.dispatcher.is_shutting_down() {
        "draining"
    } else {
        "ok"
    };
    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "in_flight": state.dispatcher.in_flight(),
    }))
}
