use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::SharedState;

/// Health-check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Id of the longest-chain head, if the tree is not empty.
    pub head: Option<String>,
    pub recovering: bool,
    /// Blocks held back until the running recovery finishes.
    pub queued: usize,
    /// Relays currently known, live or not yet evicted.
    pub relays: usize,
}

/// `GET /health`
///
/// Returns a basic JSON document indicating liveness and sync status.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let head = state.sync.head().map(|b| b.data.id);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            head,
            recovering: state.sync.is_recovering(),
            queued: state.sync.queued_blocks(),
            relays: state.nodes.lock().len(),
        }),
    )
}
