//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use ledger::{
    Block, Content, HttpPeerTransport, HttpSyncOrchestrator, MetricsRegistry, Miner, NodeKeys,
    NodeRegistry, OnionNode, OnionRouter, SignedPayload, SubmitOutcome, SyncError, key_tag, now_ms,
};

/// One accepted chat message, as served by `GET /chats`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub block_id: String,
    pub timestamp: u64,
    pub from: String,
    pub message: String,
    /// Short hash of the sender's public key.
    pub sender: String,
}

impl ChatEntry {
    /// Extracts the chat carried by `block`, if it is a chat block.
    pub fn from_block(block: &Block) -> Option<Self> {
        let Content::Chat(chat) = &block.data.content else {
            return None;
        };
        Some(Self {
            block_id: block.data.id.clone(),
            timestamp: chat.timestamp,
            from: chat.from.clone(),
            message: chat.message.clone(),
            sender: key_tag(&block.data.public_key),
        })
    }
}

#[derive(Debug, Error)]
pub enum MineError {
    #[error(transparent)]
    Rejected(#[from] SyncError),

    #[error("mining task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Shared state held by the HTTP handlers and background tasks.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor.
pub struct AppState {
    pub sync: Arc<HttpSyncOrchestrator>,
    pub router: OnionRouter<HttpPeerTransport>,
    /// This node's relay keypair.
    pub keys: NodeKeys,
    /// Live onion relays, fed by accepted `node` blocks.
    pub nodes: Arc<Mutex<NodeRegistry>>,
    /// Accepted chats, in acceptance order.
    pub chats: Arc<Mutex<Vec<ChatEntry>>>,
    pub metrics: Arc<MetricsRegistry>,
    /// Host and port advertised in this node's relay blocks.
    pub advertise_host: String,
    pub port: u16,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

/// Keeps the tree-derived views current: relays from `node` blocks and the
/// chat history from `chat` blocks.
pub fn attach_views(
    sync: &HttpSyncOrchestrator,
    nodes: Arc<Mutex<NodeRegistry>>,
    chats: Arc<Mutex<Vec<ChatEntry>>>,
    node_ttl_ms: u64,
) {
    sync.listen(move |block| {
        if let Content::OnionNode(node) = &block.data.content {
            nodes.lock().advertise(node.clone(), node_ttl_ms);
        }
    });
    sync.listen(move |block| {
        if let Some(entry) = ChatEntry::from_block(block) {
            chats.lock().push(entry);
        }
    });
}

impl AppState {
    /// Mines `payload` on top of the current head and submits the block.
    ///
    /// The nonce search runs on the blocking pool; the head may move in the
    /// meantime, in which case the block simply lands on a side branch.
    pub async fn mine_and_submit(&self, payload: SignedPayload) -> Result<SubmitOutcome, MineError> {
        let data = Miner.prepare(self.sync.head().as_ref(), payload);
        let kind = data.content.kind();

        let started = Instant::now();
        let block = tokio::task::spawn_blocking(move || Miner.solve(data)).await?;
        self.metrics
            .ledger
            .mining_seconds
            .observe(started.elapsed().as_secs_f64());
        tracing::debug!(id = %block.id(), kind, nonce = block.data.nonce, "mined block");

        Ok(self.sync.submit(block).await?)
    }

    /// Signed advertisement of this node as an onion relay.
    pub fn relay_advertisement(&self) -> Result<SignedPayload, ledger::CryptoError> {
        self.keys.sign_content(Content::OnionNode(OnionNode {
            timestamp: now_ms(),
            host: self.advertise_host.clone(),
            port: self.port,
            public_key: self.keys.public_pem().to_string(),
        }))
    }
}
