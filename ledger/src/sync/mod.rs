//! Peer synchronisation: block intake, recovery, gossip and broadcast.
//!
//! - [`orchestrator::SyncOrchestrator`] owns the ledger lock and the peer
//!   registry and implements the protocol,
//! - [`transport::PeerTransport`] abstracts the requests made of peers,
//!   with [`http::HttpPeerTransport`] as the production implementation,
//! - [`tasks`] spawns the periodic gossip and the broadcaster.

pub mod error;
pub mod http;
pub mod orchestrator;
pub mod state;
pub mod tasks;
pub mod transport;

pub use error::SyncError;
pub use http::HttpPeerTransport;
pub use orchestrator::{Ledger, SyncOrchestrator};
pub use state::{SubmitOutcome, SyncState};
pub use tasks::{forward_accepted, spawn_broadcaster, spawn_gossip};
pub use transport::{PeerTransport, TransportError};
