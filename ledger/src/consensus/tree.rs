//! Fork-aware block tree with longest-chain head tracking.
//!
//! Blocks live in an append-only vector and are never removed or
//! reordered, so a block's position is a stable handle. Parent/child links
//! are stored as positions in a parallel vector of [`TreeNode`]s, and an
//! id → position map resolves `previous_id` references. Nothing in the tree
//! points at anything else, which keeps the structure trivially cloneable
//! and serializable as a flat snapshot.
//!
//! The head is the node with the greatest ancestor count. A new block only
//! takes over the head when it is strictly deeper, so among equally deep
//! forks the one that reached that depth first wins.

use std::collections::HashMap;

use super::error::TreeError;
use crate::types::{Block, BlockId};

/// Observer invoked once per newly accepted block.
pub type BlockListener = Box<dyn Fn(&Block) + Send + Sync>;

/// Per-block bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    /// Index of the block in the tree's block vector.
    pub position: usize,
    /// Position of the parent, `None` for a root.
    pub parent: Option<usize>,
    /// Positions of the children, in insertion order.
    pub children: Vec<usize>,
    /// Number of ancestors; 0 for a root.
    pub ancestor_count: u64,
}

/// Append-only store of blocks indexed by id.
#[derive(Default)]
pub struct BlockTree {
    blocks: Vec<Block>,
    nodes: Vec<TreeNode>,
    id_index: HashMap<BlockId, usize>,
    head: Option<usize>,
    listeners: Vec<BlockListener>,
}

impl BlockTree {
    /// Creates a new, empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for newly accepted blocks.
    ///
    /// Listeners run synchronously inside [`BlockTree::add_block`], in
    /// acceptance order, so they must be cheap (push to a channel, update
    /// an index).
    pub fn listen<F>(&mut self, listener: F)
    where
        F: Fn(&Block) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Adds a block whose parent (if any) is already in the tree.
    ///
    /// Returns `Ok(true)` if the block was inserted and `Ok(false)` if a
    /// block with the same id was already present, in which case nothing
    /// changes and no listener fires.
    pub fn add_block(&mut self, block: Block) -> Result<bool, TreeError> {
        if block.data.id.is_empty() {
            return Err(TreeError::InvalidBlock);
        }
        if self.contains(&block.data.id) {
            return Ok(false);
        }

        let parent = match block.previous_id() {
            None => None,
            Some(prev) => Some(
                self.position(prev)
                    .ok_or_else(|| TreeError::InvalidParent(prev.to_string()))?,
            ),
        };
        let ancestor_count = parent.map_or(0, |p| self.nodes[p].ancestor_count + 1);

        let position = self.blocks.len();
        self.id_index.insert(block.data.id.clone(), position);
        self.nodes.push(TreeNode {
            position,
            parent,
            children: Vec::new(),
            ancestor_count,
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(position);
        }
        if self
            .head_ancestor_count()
            .is_none_or(|current| ancestor_count > current)
        {
            self.head = Some(position);
        }
        self.blocks.push(block);

        let accepted = &self.blocks[position];
        for listener in &self.listeners {
            listener(accepted);
        }
        Ok(true)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    /// Fetches a block by id, if present.
    pub fn get_block(&self, id: &str) -> Option<&Block> {
        self.position(id).map(|pos| &self.blocks[pos])
    }

    /// Bookkeeping node for `id`, if present.
    pub fn node(&self, id: &str) -> Option<&TreeNode> {
        self.position(id).map(|pos| &self.nodes[pos])
    }

    /// Returns the parent of a block held by the tree, or `None` for roots
    /// and blocks the tree does not know.
    pub fn parent(&self, block: &Block) -> Option<&Block> {
        let node = self.node(block.id())?;
        node.parent.map(|p| &self.blocks[p])
    }

    /// Head of the longest chain, `None` only when the tree is empty.
    pub fn head(&self) -> Option<&Block> {
        self.head.map(|pos| &self.blocks[pos])
    }

    /// Ancestor count of the head, `None` when the tree is empty.
    pub fn head_ancestor_count(&self) -> Option<u64> {
        self.head.map(|pos| self.nodes[pos].ancestor_count)
    }

    /// Pre-order traversal of `id` and all of its descendants, across
    /// every fork. Unknown ids yield an empty list.
    pub fn blocks_since(&self, id: &str) -> Vec<Block> {
        let Some(start) = self.position(id) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(pos) = stack.pop() {
            out.push(self.blocks[pos].clone());
            // Reversed so the first child is visited first.
            stack.extend(self.nodes[pos].children.iter().rev());
        }
        out
    }

    /// `id` and up to `count` of its ancestors, oldest first.
    ///
    /// Stops early at the root, so the result holds
    /// `min(count + 1, depth + 1)` blocks and ends with `id`.
    pub fn blocks_to(&self, id: &str, count: usize) -> Vec<Block> {
        let mut out = Vec::new();
        let mut next = self.position(id);
        while let Some(pos) = next {
            if out.len() > count {
                break;
            }
            out.push(self.blocks[pos].clone());
            next = self.nodes[pos].parent;
        }
        out.reverse();
        out
    }

    /// All blocks in insertion order. Every parent precedes its children,
    /// so replaying a snapshot in order into an empty tree rebuilds it.
    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
