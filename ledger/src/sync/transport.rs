//! Peer-to-peer transport abstraction.
//!
//! The sync layer never talks HTTP directly. It goes through
//! [`PeerTransport`], which the node implements with
//! [`HttpPeerTransport`](super::http::HttpPeerTransport) and tests implement
//! with an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

use crate::onion::OnionRequest;
use crate::types::{Block, Peer};

/// Failure to complete a request against a peer.
///
/// All variants mean the same thing to the protocol: the peer is
/// unreachable for now. Callers log, skip the peer and try again on the
/// next round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, protocol or decoding failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The peer answered with a non-success status.
    #[error("peer answered with HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,
}

/// Requests a node makes of its peers.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// Delivers a block (`POST /block`).
    async fn post_block(&self, peer: &Peer, block: &Block) -> Result<(), TransportError>;

    /// Fetches the peer's whole tree in insertion order (`GET /blockchain`).
    async fn get_snapshot(&self, peer: &Peer) -> Result<Vec<Block>, TransportError>;

    /// Fetches `id` and up to `count` ancestors (`GET /blockchain/{id}`).
    /// An empty answer means the peer does not hold `id`.
    async fn get_blocks_to(
        &self,
        peer: &Peer,
        id: &str,
        count: usize,
    ) -> Result<Vec<Block>, TransportError>;

    /// Asks the peer for a sample of its live peers (`GET /list`).
    async fn get_peers(&self, peer: &Peer, count: usize) -> Result<Vec<Peer>, TransportError>;

    /// Announces `me` to the peer (`POST /register`).
    async fn register(&self, peer: &Peer, me: &Peer) -> Result<(), TransportError>;

    /// Hands an onion request to the relay at `address` (`host:port`).
    async fn send_onion(&self, address: &str, request: &OnionRequest)
    -> Result<(), TransportError>;
}
