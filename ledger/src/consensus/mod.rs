//! Consensus layer: block tree, verification and mining.
//!
//! This module provides:
//!
//! - configuration parameters ([`config::ConsensusConfig`]),
//! - the fork-aware block tree with longest-chain head ([`tree::BlockTree`]),
//! - the block verifier and identity registry ([`verifier::Verifier`]),
//! - the proof-of-work miner ([`miner::Miner`]),
//! - and the [`engine::Engine`] that ties tree and verifier together.

pub mod config;
pub mod engine;
pub mod error;
pub mod miner;
pub mod tree;
pub mod verifier;

pub use config::ConsensusConfig;
pub use engine::{Engine, Imported};
pub use error::{TreeError, VerifyError};
pub use miner::Miner;
pub use tree::{BlockListener, BlockTree, TreeNode};
pub use verifier::{IdentityRegistry, Verifier};
