//! Core domain types used by the ledger.
//!
//! This module defines the block model (blocks, their mined data and the
//! tagged content payloads), the signed payload handed to the miner, and
//! the peer descriptors exchanged by the gossip protocol. Everything here
//! is a plain value type: serializable, cloneable and free of behaviour
//! that depends on node state.

use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

pub mod block;
pub mod content;
pub mod peer;

pub use block::{Block, BlockData, BlockId, POW_PREFIX};
pub use content::{Chat, Content, OnionNode, SignedPayload, User};
pub use peer::{Peer, PeerRecord};

/// Lowercase hex SHA-256 digest of `data`.
///
/// Block hashes, proof-of-work checks and short key tags are all derived
/// from this one function so that every node computes byte-identical
/// digests.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Falls back to 0 if the system clock is set before the epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Short, human-friendly tag for a public key: the first six hex characters
/// of its SHA-256 digest. Used to label chat senders without exposing the
/// whole PEM.
pub fn key_tag(public_key: &str) -> String {
    let mut digest = sha256_hex(public_key.as_bytes());
    digest.truncate(6);
    digest
}
