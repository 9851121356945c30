use axum::{Json, extract::State};

use crate::state::{ChatEntry, SharedState};

/// `GET /chats`
///
/// Every chat accepted by this node, oldest first.
pub async fn chats(State(state): State<SharedState>) -> Json<Vec<ChatEntry>> {
    Json(state.chats.lock().clone())
}
