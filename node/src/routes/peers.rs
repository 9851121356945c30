//! Gossip endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use ledger::Peer;

use crate::state::SharedState;

const DEFAULT_LIST_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub count: Option<usize>,
}

/// `GET /list?count=<n>`
///
/// Up to `n` distinct live peers, sampled at random.
pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Peer>> {
    let count = query.count.unwrap_or(DEFAULT_LIST_COUNT);
    Json(state.sync.sample_peers(count))
}

/// `POST /register`
///
/// Records or refreshes the announcing peer.
pub async fn register(State(state): State<SharedState>, Json(peer): Json<Peer>) -> StatusCode {
    if state.sync.register_peer(peer.clone()) {
        tracing::info!(peer = %peer.base_url(), "new peer");
    }
    StatusCode::OK
}
