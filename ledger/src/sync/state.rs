use std::collections::VecDeque;

use crate::types::Block;

/// Whether the node is applying blocks or waiting on a missing ancestor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Normal,
    /// A recovery is in flight. Incoming blocks are held back, in arrival
    /// order, until it finishes.
    Recovering { queue: VecDeque<Block> },
}

impl SyncState {
    pub fn is_recovering(&self) -> bool {
        matches!(self, SyncState::Recovering { .. })
    }

    pub fn queue_len(&self) -> usize {
        match self {
            SyncState::Normal => 0,
            SyncState::Recovering { queue } => queue.len(),
        }
    }
}

/// What [`SyncOrchestrator::submit`](super::SyncOrchestrator::submit) did
/// with a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Verified and added to the tree.
    Accepted,
    /// Already in the tree; ignored.
    AlreadyApplied,
    /// Held back until the running recovery completes.
    Queued,
    /// Its parent was missing; a recovery ran before this call returned.
    /// The block itself is not retained and arrives again through the
    /// peer snapshot or a later broadcast.
    RecoveryTriggered,
}
