//! Proof-of-work block construction.
//!
//! The miner is responsible for assembling a candidate block on top of the
//! current head and searching for a nonce whose block hash carries the
//! [`POW_PREFIX`]. It performs no validation and no insertion; callers hand
//! the result to the sync layer like any other block.

use uuid::Uuid;

use crate::types::{Block, BlockData, POW_PREFIX, SignedPayload};

use super::tree::BlockTree;

/// Stateless proof-of-work miner.
#[derive(Clone, Copy, Debug, Default)]
pub struct Miner;

impl Miner {
    pub fn new() -> Self {
        Self
    }

    /// Builds unmined block data extending `head` (or a root when `None`).
    pub fn prepare(&self, head: Option<&Block>, payload: SignedPayload) -> BlockData {
        BlockData {
            id: Uuid::new_v4().to_string(),
            sequence: head.map_or(0, |h| h.data.sequence + 1),
            nonce: 0,
            previous_id: head.map(|h| h.data.id.clone()),
            signature: payload.signature,
            public_key: payload.public_key,
            content: payload.content,
        }
    }

    /// Searches nonces upward from 0 until the hash meets the target.
    ///
    /// The returned block carries exactly the nonce that produced its hash.
    /// CPU-bound; async callers should run it on a blocking thread.
    pub fn solve(&self, mut data: BlockData) -> Block {
        data.nonce = 0;
        loop {
            let hash = data.compute_hash();
            if hash.starts_with(POW_PREFIX) {
                return Block { data, hash };
            }
            data.nonce = data.nonce.wrapping_add(1);
        }
    }

    /// Prepares and solves a block on top of the tree's current head.
    pub fn mine(&self, tree: &BlockTree, payload: SignedPayload) -> Block {
        let data = self.prepare(tree.head(), payload);
        let block = self.solve(data);
        tracing::debug!(id = %block.id(), nonce = block.data.nonce, "mined block");
        block
    }
}
