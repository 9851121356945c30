//! Ledger library crate.
//!
//! This crate provides the building blocks of a peer-to-peer chat ledger
//! whose messages are ordered by proof-of-work blocks and delivered through
//! three-hop onion circuits:
//!
//! - block, content and peer types (`types`),
//! - the block tree, verifier and miner (`consensus`),
//! - RSA keys, signatures and onion envelopes (`crypto`),
//! - TTL-based peer and relay directories (`registry`),
//! - block intake, recovery, gossip and broadcast (`sync`),
//! - onion circuit construction and relaying (`onion`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level node configuration (`config`).
//!
//! The `node` binary composes these pieces behind an HTTP API.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod metrics;
pub mod onion;
pub mod registry;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export top-level configuration types.
pub use config::{LedgerConfig, MetricsConfig, RegistryConfig, SyncConfig};

// Re-export "core" consensus types.
pub use consensus::{
    BlockTree, ConsensusConfig, Engine, IdentityRegistry, Imported, Miner, TreeError, Verifier,
    VerifyError,
};

pub use crypto::{CryptoError, KeyFileError, NodeKeys, load_or_generate};
pub use onion::{Layer, OnionError, OnionRequest, OnionRouter};
pub use registry::{NodeRecord, NodeRegistry, PeerRegistry};
pub use sync::{
    HttpPeerTransport, PeerTransport, SubmitOutcome, SyncError, SyncOrchestrator, SyncState,
    TransportError,
};

// Re-export metrics registry and ledger metrics.
pub use metrics::{LedgerMetrics, MetricsRegistry, run_prometheus_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Orchestrator over the HTTP transport, as run by a node.
pub type HttpSyncOrchestrator = SyncOrchestrator<HttpPeerTransport>;
