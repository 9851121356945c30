//! Block verification: proof of work, lineage and content integrity.
//!
//! The verifier is the only place that decides whether a block may enter
//! the tree. Checks run cheapest first and fail fast:
//!
//! 1. block-local checks (id present, hash prefix, hash recomputation),
//! 2. lineage against the local tree (parent known, sequence follows it),
//! 3. content checks (chat identity and signature).
//!
//! The verifier also owns the identity registry that binds display names to
//! public keys. It is fed exclusively by accepted `user` blocks, after every
//! other check passed, so a rejected block never leaves a trace in it.

use std::collections::HashMap;

use crate::crypto::verify_signature;
use crate::types::{Block, Chat, Content, key_tag};

use super::config::ConsensusConfig;
use super::error::VerifyError;
use super::tree::BlockTree;

/// Append-only `public_key → name` map. The first registration of a key wins.
///
/// Names are not unique across keys, but the first key to register a name
/// owns it: chats signed by any other key cannot claim that name.
#[derive(Clone, Debug, Default)]
pub struct IdentityRegistry {
    names: HashMap<String, String>,
    owners: HashMap<String, String>,
}

impl IdentityRegistry {
    pub fn name_of(&self, public_key: &str) -> Option<&str> {
        self.names.get(public_key).map(String::as_str)
    }

    /// Key that first registered `name`.
    pub fn owner_of(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(String::as_str)
    }

    /// Binds `name` to `public_key` unless the key is already bound.
    /// Returns `true` if a new binding was recorded.
    pub fn register(&mut self, public_key: &str, name: &str) -> bool {
        if self.names.contains_key(public_key) {
            return false;
        }
        self.names.insert(public_key.to_string(), name.to_string());
        self.owners
            .entry(name.to_string())
            .or_insert_with(|| public_key.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Stateful block verifier.
#[derive(Clone, Debug, Default)]
pub struct Verifier {
    config: ConsensusConfig,
    identities: IdentityRegistry,
}

impl Verifier {
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            config,
            identities: IdentityRegistry::default(),
        }
    }

    pub fn identities(&self) -> &IdentityRegistry {
        &self.identities
    }

    /// Checks `block` against `tree` and, if it is a valid `user` block,
    /// records its identity binding.
    ///
    /// [`VerifyError::MissingAncestor`] is the only recoverable outcome; the
    /// caller is expected to fetch the ancestor and retry.
    pub fn verify(&mut self, tree: &BlockTree, block: &Block) -> Result<(), VerifyError> {
        self.check_block_local(block)?;
        self.check_lineage(tree, block)?;
        self.check_content(block)?;

        if let Content::User(user) = &block.data.content {
            if self.identities.register(&user.public_key, &user.name) {
                tracing::debug!(name = %user.name, "registered identity");
            }
        }
        Ok(())
    }

    fn check_block_local(&self, block: &Block) -> Result<(), VerifyError> {
        if block.data.id.is_empty() {
            return Err(VerifyError::InvalidBlock("missing id"));
        }
        if !block.meets_target() {
            return Err(VerifyError::ProofOfWorkInvalid {
                hash: block.hash.clone(),
            });
        }
        let computed = block.data.compute_hash();
        if computed != block.hash {
            return Err(VerifyError::HashMismatch {
                claimed: block.hash.clone(),
                computed,
            });
        }
        Ok(())
    }

    fn check_lineage(&self, tree: &BlockTree, block: &Block) -> Result<(), VerifyError> {
        let Some(previous_id) = block.previous_id() else {
            if block.data.sequence != 0 {
                return Err(VerifyError::InvalidBlock("root block must have sequence 0"));
            }
            return Ok(());
        };

        let parent = tree
            .get_block(previous_id)
            .ok_or_else(|| VerifyError::MissingAncestor {
                missing: previous_id.to_string(),
            })?;

        if parent.id() != previous_id || parent.data.sequence + 1 != block.data.sequence {
            return Err(VerifyError::LineageViolation {
                expected: previous_id.to_string(),
            });
        }
        Ok(())
    }

    fn check_content(&self, block: &Block) -> Result<(), VerifyError> {
        match &block.data.content {
            Content::Chat(chat) => self.check_chat(block, chat),
            Content::User(_) | Content::OnionNode(_) => Ok(()),
        }
    }

    fn check_chat(&self, block: &Block, chat: &Chat) -> Result<(), VerifyError> {
        match self.identities.name_of(&block.data.public_key) {
            Some(registered) if registered != chat.from => {
                return Err(VerifyError::IdentityMismatch {
                    claimed: chat.from.clone(),
                    registered: registered.to_string(),
                });
            }
            Some(_) => {}
            None if self.config.require_registered_identity => {
                return Err(VerifyError::UnknownIdentity);
            }
            None => {}
        }

        if let Some(owner) = self.identities.owner_of(&chat.from) {
            if owner != block.data.public_key {
                return Err(VerifyError::IdentityMismatch {
                    claimed: chat.from.clone(),
                    registered: format!("{} (key {})", chat.from, key_tag(owner)),
                });
            }
        }

        verify_signature(
            &block.data.public_key,
            &block.data.content.canonical_bytes(),
            &block.data.signature,
        )
        .map_err(|_| VerifyError::SignatureInvalid)
    }
}
