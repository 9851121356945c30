//! High-level consensus engine.
//!
//! The engine wires together the [`BlockTree`] and the [`Verifier`] and
//! exposes a single entry point, [`Engine::import_block`], used both for
//! locally mined blocks and for blocks received from the network. It holds
//! no locks and does no I/O; the sync layer owns it behind the node lock.

use crate::types::Block;

use super::config::ConsensusConfig;
use super::error::VerifyError;
use super::tree::BlockTree;
use super::verifier::Verifier;

/// Result of a successful import.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Imported {
    /// The block was verified and added to the tree.
    Added,
    /// A block with the same id was already in the tree; nothing changed.
    AlreadyKnown,
}

/// Tree plus verifier.
#[derive(Default)]
pub struct Engine {
    tree: BlockTree,
    verifier: Verifier,
}

impl Engine {
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            tree: BlockTree::new(),
            verifier: Verifier::new(config),
        }
    }

    pub fn tree(&self) -> &BlockTree {
        &self.tree
    }

    /// Registers a tree listener; see [`BlockTree::listen`].
    pub fn listen<F>(&mut self, listener: F)
    where
        F: Fn(&Block) + Send + Sync + 'static,
    {
        self.tree.listen(listener);
    }

    /// Verifies and inserts a block.
    ///
    /// Duplicates short-circuit before verification, so re-delivered blocks
    /// are cheap and never re-register identities.
    pub fn import_block(&mut self, block: Block) -> Result<Imported, VerifyError> {
        if self.tree.contains(block.id()) {
            return Ok(Imported::AlreadyKnown);
        }

        self.verifier.verify(&self.tree, &block)?;

        let id = block.data.id.clone();
        let kind = block.data.content.kind();
        self.tree.add_block(block)?;
        tracing::info!(
            %id,
            kind,
            height = self.tree.head_ancestor_count().unwrap_or_default(),
            "accepted block"
        );
        Ok(Imported::Added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chat_payload, mine_on, test_keys, user_payload};

    #[test]
    fn import_updates_head() {
        let keys = test_keys();
        let mut engine = Engine::default();

        let b0 = mine_on(None, user_payload(&keys, "alice"));
        assert_eq!(engine.import_block(b0.clone()).unwrap(), Imported::Added);
        let b1 = mine_on(Some(&b0), chat_payload(&keys, "alice", "one"));
        engine.import_block(b1.clone()).unwrap();

        assert_eq!(engine.tree().head(), Some(&b1));
        assert_eq!(engine.tree().len(), 2);
    }

    #[test]
    fn duplicate_import_is_already_known() {
        let keys = test_keys();
        let mut engine = Engine::default();
        let b0 = mine_on(None, user_payload(&keys, "alice"));

        engine.import_block(b0.clone()).unwrap();
        assert_eq!(engine.import_block(b0).unwrap(), Imported::AlreadyKnown);
        assert_eq!(engine.tree().len(), 1);
    }

    #[test]
    fn fork_scenario_switches_head_to_the_longer_branch() {
        let keys = test_keys();
        let mut engine = Engine::default();

        let a = mine_on(None, user_payload(&keys, "alice"));
        engine.import_block(a.clone()).unwrap();
        let b = mine_on(Some(&a), chat_payload(&keys, "alice", "b"));
        let c = mine_on(Some(&a), chat_payload(&keys, "alice", "c"));
        engine.import_block(b.clone()).unwrap();
        engine.import_block(c.clone()).unwrap();
        assert_eq!(engine.tree().head(), Some(&b));

        let d = mine_on(Some(&c), chat_payload(&keys, "alice", "d"));
        engine.import_block(d.clone()).unwrap();
        assert_eq!(engine.tree().head(), Some(&d));

        let ids: Vec<_> = engine
            .tree()
            .blocks_to(d.id(), 10)
            .iter()
            .map(|blk| blk.id().to_string())
            .collect();
        assert_eq!(ids, vec![a.id(), c.id(), d.id()]);
    }

    #[test]
    fn rejected_block_leaves_the_tree_untouched() {
        let keys = test_keys();
        let mut engine = Engine::default();
        let mut bad = mine_on(None, user_payload(&keys, "alice"));
        bad.hash = "000deadbeef".to_string();

        assert!(engine.import_block(bad).is_err());
        assert!(engine.tree().is_empty());
    }
}
