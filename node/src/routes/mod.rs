//! HTTP handlers, one module per concern.

pub mod blocks;
pub mod chats;
pub mod health;
pub mod onion;
pub mod peers;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::SharedState;

/// The node's full HTTP surface.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/block", post(blocks::post_block))
        .route("/blockchain", get(blocks::get_blockchain))
        .route("/blockchain/{id}", get(blocks::get_blocks_to))
        .route("/list", get(peers::list))
        .route("/register", post(peers::register))
        .route("/request", post(onion::request))
        .route("/send", post(onion::send))
        .route("/chats", get(chats::chats))
        .with_state(state)
}
