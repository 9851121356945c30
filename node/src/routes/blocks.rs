//! Block exchange endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use ledger::{Block, SubmitOutcome, SyncError};

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
}

/// `POST /block`
///
/// Hands a block to the sync layer. Anything short of an outright
/// rejection is a success for the sender, including blocks held back or
/// used to trigger a recovery.
pub async fn post_block(
    State(state): State<SharedState>,
    Json(block): Json<Block>,
) -> Result<Json<SubmitResponse>, (StatusCode, String)> {
    let status = match state.sync.submit(block).await {
        Ok(SubmitOutcome::Accepted) => "accepted",
        Ok(SubmitOutcome::AlreadyApplied) => "duplicate",
        Ok(SubmitOutcome::Queued) => "queued",
        Ok(SubmitOutcome::RecoveryTriggered) => "recovering",
        Err(SyncError::Rejected(err)) => return Err((StatusCode::BAD_REQUEST, err.to_string())),
    };
    Ok(Json(SubmitResponse { status }))
}

#[derive(Debug, Deserialize)]
pub struct SinceQuery {
    pub since: Option<String>,
}

/// `GET /blockchain[?since=<id>]`
///
/// Without `since`, the whole tree in insertion order. With it, `since`
/// and every descendant across all forks.
pub async fn get_blockchain(
    State(state): State<SharedState>,
    Query(query): Query<SinceQuery>,
) -> Json<Vec<Block>> {
    let blocks = match query.since {
        Some(id) => state.sync.blocks_since(&id),
        None => state.sync.snapshot(),
    };
    Json(blocks)
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    #[serde(default)]
    pub count: usize,
}

/// `GET /blockchain/{id}?count=<n>`
///
/// `id` and up to `n` of its ancestors, oldest first. Empty if `id` is
/// unknown.
pub async fn get_blocks_to(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<CountQuery>,
) -> Json<Vec<Block>> {
    Json(state.sync.blocks_to(&id, query.count))
}
