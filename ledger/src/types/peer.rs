//! Peer descriptors exchanged by the gossip protocol.

use serde::{Deserialize, Serialize};

/// A gossip peer as it announces itself on `POST /register`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    pub address: String,
    pub port: u16,
    /// How long, in milliseconds, the peer should be considered alive after
    /// its last registration.
    pub ttl: u64,
    /// Bootstrap peers configured at startup. They never expire.
    ///
    /// Only local configuration sets this; a flag claimed over the wire is
    /// ignored.
    #[serde(skip_deserializing)]
    pub is_master: bool,
}

impl Peer {
    pub fn new(address: impl Into<String>, port: u16, ttl: u64) -> Self {
        Self {
            address: address.into(),
            port,
            ttl,
            is_master: false,
        }
    }

    /// `http://address:port` base URL of the peer's HTTP surface.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }

    /// Same `(address, port)` endpoint, regardless of ttl or master flag.
    pub fn same_endpoint(&self, other: &Peer) -> bool {
        self.address == other.address && self.port == other.port
    }
}

/// A peer plus the local time at which we last heard from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRecord {
    pub peer: Peer,
    /// Milliseconds since the Unix epoch.
    pub last_seen_at: u64,
}

impl PeerRecord {
    pub fn new(peer: Peer, last_seen_at: u64) -> Self {
        Self { peer, last_seen_at }
    }
}
