use thiserror::Error;

use crate::consensus::VerifyError;

/// Errors surfaced to whoever submitted a block.
///
/// Missing ancestors and unreachable peers are handled inside the sync
/// layer and never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("block rejected: {0}")]
    Rejected(#[from] VerifyError),
}
