//! Onion relay and client entry endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use ledger::crypto::verify_signature;
use ledger::onion::peel;
use ledger::{Layer, OnionError, OnionRequest, SignedPayload};

use crate::state::SharedState;

/// `POST /request`
///
/// Peels one layer with this node's key. Relay layers are forwarded to the
/// next hop and exit layers are mined, both in the background so the
/// previous hop is released as soon as the layer is known to be ours.
pub async fn request(
    State(state): State<SharedState>,
    Json(request): Json<OnionRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let layer = peel(&request, &state.keys).map_err(|e| {
        tracing::warn!(error = %e, "cannot peel onion layer");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    match layer {
        Layer::Relay { next, encrypted } => {
            tokio::spawn(async move {
                if let Err(e) = state.router.forward(&next, encrypted).await {
                    tracing::warn!(%next, error = %e, "failed to forward onion layer");
                }
            });
        }
        Layer::Exit { content } => {
            tracing::info!(kind = content.content.kind(), "exit layer reached, mining payload");
            tokio::spawn(async move {
                if let Err(e) = state.mine_and_submit(content).await {
                    tracing::warn!(error = %e, "exit payload was not accepted");
                }
            });
        }
    }
    Ok(StatusCode::OK)
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub status: &'static str,
    /// Entry relay the circuit starts at.
    pub entry: String,
}

/// `POST /send`
///
/// Client entry point: checks the payload signature, then onion-routes the
/// payload through three randomly chosen live relays.
pub async fn send(
    State(state): State<SharedState>,
    Json(payload): Json<SignedPayload>,
) -> Result<Json<SendResponse>, (StatusCode, String)> {
    verify_signature(
        &payload.public_key,
        &payload.content.canonical_bytes(),
        &payload.signature,
    )
    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let entry = state.router.route(&payload).await.map_err(|e| {
        let status = match e {
            OnionError::NotEnoughRelays { .. } => StatusCode::SERVICE_UNAVAILABLE,
            OnionError::Transport(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = %e, "onion routing failed");
        (status, e.to_string())
    })?;

    Ok(Json(SendResponse {
        status: "sent",
        entry,
    }))
}
