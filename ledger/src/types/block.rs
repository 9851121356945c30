// ledger/src/types/block.rs

//! Block types and hashing.
//!
//! This module defines the block data structures used by the ledger,
//! together with the canonical serialization and the SHA-256 content hash
//! that makes every block self-certifying.
//!
//! Serialization is compact JSON via `serde_json`, with fields in
//! declaration order. The same canonical encoding is used everywhere we
//! need block bytes: mining, verification and the wire format.

use serde::{Deserialize, Serialize};

use super::{Content, SignedPayload, sha256_hex};

/// Proof-of-work target: every accepted block hash starts with this prefix.
pub const POW_PREFIX: &str = "000";

/// Unique block identifier (a UUID v4 string assigned by the miner).
pub type BlockId = String;

/// The mined part of a block.
///
/// Everything in here is covered by the block hash, including the nonce
/// that satisfies the proof-of-work prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    /// Unique identifier, stable for the lifetime of the block.
    pub id: BlockId,

    /// Parent's sequence plus one, or 0 for a root block.
    pub sequence: u64,

    /// Proof-of-work nonce.
    pub nonce: u64,

    /// Identifier of the parent block, `None` for a root.
    pub previous_id: Option<BlockId>,

    /// Hex signature over the canonical bytes of `content`.
    pub signature: String,

    /// PKCS#8 PEM public key of the content author.
    pub public_key: String,

    pub content: Content,
}

impl BlockData {
    /// Returns the canonical byte representation of this block data.
    ///
    /// All hashing that depends on a "canonical" form must go through this
    /// method to avoid format drift between miner and verifier.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Plain derived Serialize with string keys; encoding cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Computes the hex SHA-256 digest of [`BlockData::canonical_bytes`].
    pub fn compute_hash(&self) -> String {
        sha256_hex(&self.canonical_bytes())
    }

    /// Reassembles the payload the block was mined from.
    pub fn payload(&self) -> SignedPayload {
        SignedPayload {
            content: self.content.clone(),
            signature: self.signature.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// A mined block: its data plus the hash that satisfied the proof of work.
///
/// Blocks are immutable once mined. The tree stores them by value and
/// hands out clones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub data: BlockData,
    /// Lowercase hex SHA-256 of `data`'s canonical serialization.
    pub hash: String,
}

impl Block {
    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn previous_id(&self) -> Option<&str> {
        self.data.previous_id.as_deref()
    }

    /// `true` if the stored hash carries the proof-of-work prefix.
    pub fn meets_target(&self) -> bool {
        self.hash.starts_with(POW_PREFIX)
    }

    /// `true` if recomputing the hash from `data` reproduces `hash`.
    pub fn is_self_consistent(&self) -> bool {
        self.data.compute_hash() == self.hash
    }
}
