//! Top-level configuration for a ledger node.
//!
//! This module aggregates configuration for:
//!
//! - consensus parameters (`ConsensusConfig`),
//! - the sync protocol (recovery fan-out, gossip cadence, timeouts),
//! - the relay directory (how long a `node` advertisement stays valid),
//! - metrics exporter (enable flag + listen address).
//!
//! Binaries construct a `LedgerConfig` from defaults and override the
//! fields they expose through the environment.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::consensus::ConsensusConfig;

/// Sync protocol tuning.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Peers asked for a missing ancestor before recovery gives up.
    pub recovery_peer_count: usize,
    /// Delay between gossip rounds.
    pub gossip_interval: Duration,
    /// Peers contacted per gossip round.
    pub gossip_fanout: usize,
    /// Peers requested from each gossip partner.
    pub peer_list_count: usize,
    /// Upper bound on any single peer request.
    pub request_timeout: Duration,
    /// TTL (ms) this node announces for itself when registering with peers.
    pub advertised_ttl_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            recovery_peer_count: 3,
            gossip_interval: Duration::from_secs(30),
            gossip_fanout: 3,
            peer_list_count: 10,
            request_timeout: Duration::from_secs(2),
            advertised_ttl_ms: 90_000,
        }
    }
}

/// Relay directory tuning.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// How long (ms) a relay stays usable after its newest advertisement.
    /// Should comfortably exceed the relay heartbeat interval.
    pub node_ttl_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { node_ttl_ms: 90_000 }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 9898)),
        }
    }
}

/// Top-level configuration for a ledger node.
#[derive(Clone, Debug, Default)]
pub struct LedgerConfig {
    pub consensus: ConsensusConfig,
    pub sync: SyncConfig,
    pub registry: RegistryConfig,
    pub metrics: MetricsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_relays_alive_across_heartbeats() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.sync.recovery_peer_count, 3);
        assert_eq!(cfg.sync.gossip_interval, Duration::from_secs(30));
        assert!(cfg.registry.node_ttl_ms > cfg.sync.gossip_interval.as_millis() as u64);
        assert!(!cfg.consensus.require_registered_identity);
        assert_eq!(cfg.metrics.listen_addr.port(), 9898);
    }
}
