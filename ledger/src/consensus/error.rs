use thiserror::Error;

use crate::types::BlockId;

/// Structural errors raised by [`BlockTree::add_block`](super::BlockTree::add_block).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The block has no usable identifier.
    #[error("invalid block: missing id")]
    InvalidBlock,

    /// `previous_id` names a block the tree does not hold.
    #[error("invalid parent: {0} is not in the tree")]
    InvalidParent(BlockId),
}

/// Reasons a candidate block is refused by the [`Verifier`](super::Verifier).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Malformed input.
    #[error("invalid block: {0}")]
    InvalidBlock(&'static str),

    /// The claimed hash does not carry the proof-of-work prefix.
    #[error("hash {hash} does not meet the proof-of-work target")]
    ProofOfWorkInvalid { hash: String },

    /// The claimed hash is not the digest of the block data.
    #[error("claimed hash {claimed} does not match computed {computed}")]
    HashMismatch { claimed: String, computed: String },

    /// The parent is not in the local tree yet. Recoverable: the sync layer
    /// answers this by fetching ancestors from peers.
    #[error("ancestor {missing} is missing from the local tree")]
    MissingAncestor { missing: BlockId },

    /// The resolved parent is not the block `previous_id` names.
    #[error("block does not descend from {expected}")]
    LineageViolation { expected: BlockId },

    /// The chat's `from` conflicts with the identity registry: its key is
    /// registered under another name, or the name belongs to another key.
    #[error("chat claims to be from {claimed} but the registered identity is {registered}")]
    IdentityMismatch { claimed: String, registered: String },

    /// The content signature does not verify under the block's public key.
    #[error("content signature is invalid")]
    SignatureInvalid,

    /// Strict mode only: the chat key was never registered.
    #[error("public key is not registered to any user")]
    UnknownIdentity,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl VerifyError {
    /// `true` for the one error the sync layer recovers from instead of
    /// rejecting the block.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VerifyError::MissingAncestor { .. })
    }
}
