//! TTL-based directories of gossip peers and onion relays.
//!
//! A [`Directory`] keeps entries keyed by their `(host, port)` endpoint and
//! evicts them lazily: nothing expires on a timer, expired entries are
//! dropped whenever a scan happens to meet them. Sampling is a partial
//! Fisher–Yates shuffle over the live prefix of the entry vector, so each
//! call returns distinct entries without copying the whole directory.

use std::collections::HashMap;

use rand::Rng;

use crate::types::{OnionNode, Peer, PeerRecord, now_ms};

/// Endpoint key shared by peers and relays.
pub type Endpoint = (String, u16);

/// Directory entry with an expiry rule.
pub trait Liveness: Clone {
    fn endpoint(&self) -> Endpoint;

    /// `true` once the entry should no longer be handed out at `now` (ms).
    fn is_expired(&self, now: u64) -> bool;

    /// Merges a fresher sighting of the same endpoint into `self`.
    fn refresh(&mut self, newer: Self);
}

/// Endpoint-keyed set of [`Liveness`] entries.
#[derive(Clone, Debug)]
pub struct Directory<E> {
    entries: Vec<E>,
    index: HashMap<Endpoint, usize>,
}

impl<E> Default for Directory<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<E: Liveness> Directory<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry`, or refreshes the entry already stored for its
    /// endpoint. Returns `true` if the endpoint was new.
    pub fn upsert(&mut self, entry: E) -> bool {
        match self.index.get(&entry.endpoint()) {
            Some(&pos) => {
                self.entries[pos].refresh(entry);
                false
            }
            None => {
                self.index.insert(entry.endpoint(), self.entries.len());
                self.entries.push(entry);
                true
            }
        }
    }

    /// Up to `count` distinct live entries, uniformly at random.
    pub fn sample(&mut self, count: usize) -> Vec<E> {
        self.sample_with(count, now_ms(), &mut rand::thread_rng())
    }

    /// [`Directory::sample`] with an explicit clock and RNG.
    ///
    /// Picks are swapped behind a shrinking `live_end` boundary. An expired
    /// pick is removed on the spot and the scan continues, so the result is
    /// short only when fewer than `count` live entries exist.
    pub fn sample_with<R: Rng + ?Sized>(&mut self, count: usize, now: u64, rng: &mut R) -> Vec<E> {
        let mut picked = Vec::with_capacity(count.min(self.entries.len()));
        let mut live_end = self.entries.len();
        let mut evicted = false;

        while picked.len() < count && live_end > 0 {
            let pick = rng.gen_range(0..live_end);
            self.entries.swap(pick, live_end - 1);
            live_end -= 1;

            if self.entries[live_end].is_expired(now) {
                // Everything past live_end was already picked; the order
                // there does not matter.
                self.entries.swap_remove(live_end);
                evicted = true;
            } else {
                picked.push(self.entries[live_end].clone());
            }
        }

        // Swaps moved entries around even without evictions.
        self.reindex();
        if evicted {
            tracing::debug!(remaining = self.entries.len(), "evicted expired entries");
        }
        picked
    }

    /// Every live entry, evicting the expired ones.
    pub fn all_live(&mut self) -> Vec<E> {
        self.all_live_at(now_ms())
    }

    pub fn all_live_at(&mut self, now: u64) -> Vec<E> {
        let before = self.entries.len();
        self.entries.retain(|e| !e.is_expired(now));
        if self.entries.len() != before {
            self.reindex();
        }
        self.entries.clone()
    }

    pub fn get(&self, endpoint: &Endpoint) -> Option<&E> {
        self.index.get(endpoint).map(|&pos| &self.entries[pos])
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, entry) in self.entries.iter().enumerate() {
            self.index.insert(entry.endpoint(), pos);
        }
    }
}

impl Liveness for PeerRecord {
    fn endpoint(&self) -> Endpoint {
        (self.peer.address.clone(), self.peer.port)
    }

    fn is_expired(&self, now: u64) -> bool {
        !self.peer.is_master && now.saturating_sub(self.last_seen_at) > self.peer.ttl
    }

    fn refresh(&mut self, newer: Self) {
        self.last_seen_at = self.last_seen_at.max(newer.last_seen_at);
        self.peer.ttl = newer.peer.ttl;
        self.peer.is_master |= newer.peer.is_master;
    }
}

/// Gossip peers.
pub type PeerRegistry = Directory<PeerRecord>;

impl Directory<PeerRecord> {
    /// Records that `peer` was heard from just now.
    pub fn register(&mut self, peer: Peer) -> bool {
        self.register_at(peer, now_ms())
    }

    pub fn register_at(&mut self, peer: Peer, now: u64) -> bool {
        self.upsert(PeerRecord::new(peer, now))
    }

    /// Sampled live peers, without their bookkeeping.
    pub fn sample_peers(&mut self, count: usize) -> Vec<Peer> {
        self.sample(count).into_iter().map(|r| r.peer).collect()
    }

    pub fn live_peers(&mut self) -> Vec<Peer> {
        self.all_live().into_iter().map(|r| r.peer).collect()
    }
}

/// A relay advertisement plus the lifetime granted to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub node: OnionNode,
    pub ttl_ms: u64,
}

impl Liveness for NodeRecord {
    fn endpoint(&self) -> Endpoint {
        (self.node.host.clone(), self.node.port)
    }

    fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.node.timestamp) > self.ttl_ms
    }

    fn refresh(&mut self, newer: Self) {
        // Blocks replayed during recovery carry old advertisements; they
        // must not roll a relay's liveness (or key) back.
        if newer.node.timestamp >= self.node.timestamp {
            self.node = newer.node;
            self.ttl_ms = newer.ttl_ms;
        }
    }
}

/// Onion relays, fed by accepted `node` blocks.
pub type NodeRegistry = Directory<NodeRecord>;

impl Directory<NodeRecord> {
    pub fn advertise(&mut self, node: OnionNode, ttl_ms: u64) -> bool {
        self.upsert(NodeRecord { node, ttl_ms })
    }

    /// Up to `count` distinct live relays.
    pub fn sample_nodes(&mut self, count: usize) -> Vec<OnionNode> {
        self.sample(count).into_iter().map(|r| r.node).collect()
    }
}
