//! Block intake, missing-ancestor recovery, gossip and broadcast.
//!
//! All ledger state (tree, verifier, hold-back queue) sits behind one
//! `parking_lot::Mutex` so that "check state, verify, insert" is atomic.
//! The lock is only ever taken inside synchronous helpers; every network
//! call happens with it released.
//!
//! Recovery works as follows. When a block arrives whose parent is
//! unknown, the node switches to [`SyncState::Recovering`] and asks a few
//! sampled peers whether they hold the missing block. The first one that
//! does has its whole snapshot replayed into the local tree. Either way the
//! node then returns to normal and drains, in FIFO order, the blocks that
//! were held back meanwhile. A drained block that is itself missing an
//! ancestor is dropped and starts a new recovery for that ancestor; the rest
//! of the queue stays held back. Each pass consumes at least one queued
//! block, so the loop ends.

use std::collections::VecDeque;
use std::future::Future;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;

use super::error::SyncError;
use super::state::{SubmitOutcome, SyncState};
use super::transport::{PeerTransport, TransportError};
use crate::config::SyncConfig;
use crate::consensus::{ConsensusConfig, Engine, Imported, VerifyError};
use crate::metrics::MetricsRegistry;
use crate::registry::PeerRegistry;
use crate::types::{Block, BlockId, Peer};

/// Everything guarded by the node lock.
#[derive(Default)]
pub struct Ledger {
    pub engine: Engine,
    pub state: SyncState,
}

/// Coordinates the local ledger with its peers.
///
/// Shared between the HTTP handlers and the background tasks behind an
/// [`Arc`].
pub struct SyncOrchestrator<T> {
    config: SyncConfig,
    ledger: Mutex<Ledger>,
    peers: Mutex<PeerRegistry>,
    transport: Arc<T>,
    local: Peer,
    metrics: Arc<MetricsRegistry>,
}

impl<T: PeerTransport> SyncOrchestrator<T> {
    /// Creates an orchestrator for the node reachable at `local`.
    pub fn new(
        config: SyncConfig,
        consensus: ConsensusConfig,
        local: Peer,
        transport: Arc<T>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            config,
            ledger: Mutex::new(Ledger {
                engine: Engine::new(consensus),
                state: SyncState::Normal,
            }),
            peers: Mutex::new(PeerRegistry::new()),
            transport,
            local,
            metrics,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn local_peer(&self) -> &Peer {
        &self.local
    }

    /// Registers a listener for newly accepted blocks, from any source.
    pub fn listen<F>(&self, listener: F)
    where
        F: Fn(&Block) + Send + Sync + 'static,
    {
        self.ledger.lock().engine.listen(listener);
    }

    /// Runs `f` with the node lock held.
    ///
    /// `f` must not block; the lock serializes every block intake.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut self.ledger.lock())
    }

    // ---- write path ----

    /// Single entry point for blocks: local mining, peer delivery and
    /// exit relays all come through here.
    ///
    /// A recovery started by this block runs on its own task. Dropping the
    /// returned future stops the wait, never the recovery, so the node
    /// always returns to normal and drains its hold-back queue.
    pub async fn submit(self: &Arc<Self>, block: Block) -> Result<SubmitOutcome, SyncError> {
        let missing = match self.intake(block)? {
            Ok(outcome) => return Ok(outcome),
            Err(missing) => missing,
        };

        let orchestrator = Arc::clone(self);
        let recovery = tokio::spawn(async move { orchestrator.recover(missing).await });
        if let Err(err) = recovery.await {
            tracing::error!(error = %err, "recovery task failed");
        }
        Ok(SubmitOutcome::RecoveryTriggered)
    }

    /// Applies or queues a block under the lock. `Ok(Err(missing))` means
    /// the node has just switched to recovering for `missing`.
    fn intake(&self, block: Block) -> Result<Result<SubmitOutcome, BlockId>, SyncError> {
        let mut ledger = self.ledger.lock();

        if let SyncState::Recovering { queue } = &mut ledger.state {
            tracing::debug!(id = %block.id(), "recovery in progress, holding block back");
            queue.push_back(block);
            self.metrics.ledger.hold_back_queue.set(queue.len() as i64);
            return Ok(Ok(SubmitOutcome::Queued));
        }

        let id = block.data.id.clone();
        match ledger.engine.import_block(block) {
            Ok(Imported::Added) => {
                self.metrics.ledger.blocks_accepted.inc();
                Ok(Ok(SubmitOutcome::Accepted))
            }
            Ok(Imported::AlreadyKnown) => Ok(Ok(SubmitOutcome::AlreadyApplied)),
            Err(VerifyError::MissingAncestor { missing }) => {
                ledger.state = SyncState::Recovering {
                    queue: VecDeque::new(),
                };
                Ok(Err(missing))
            }
            Err(err) => {
                self.metrics.ledger.blocks_rejected.inc();
                tracing::warn!(%id, error = %err, "rejected block");
                Err(SyncError::Rejected(err))
            }
        }
    }

    async fn recover(&self, mut missing: BlockId) {
        loop {
            self.metrics.ledger.recoveries.inc();
            tracing::info!(%missing, "starting recovery");

            match self.fetch_holder_snapshot(&missing).await {
                Some((peer, snapshot)) => {
                    let added = self.replay(snapshot);
                    tracing::info!(%missing, peer = %peer.base_url(), added, "replayed peer snapshot");
                }
                None => tracing::warn!(%missing, "no sampled peer holds the missing block"),
            }

            match self.finish_recovery() {
                None => return,
                Some(next) => missing = next,
            }
        }
    }

    /// Asks sampled peers, one at a time, for `missing`; returns the
    /// snapshot of the first one that has it.
    async fn fetch_holder_snapshot(&self, missing: &str) -> Option<(Peer, Vec<Block>)> {
        let candidates = self.sample_remote_peers(self.config.recovery_peer_count);

        for peer in candidates {
            let probe = self
                .with_timeout(self.transport.get_blocks_to(&peer, missing, 1))
                .await;
            match probe {
                Ok(blocks) if blocks.iter().any(|b| b.id() == missing) => {}
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(peer = %peer.base_url(), error = %err, "recovery probe failed");
                    continue;
                }
            }

            match self
                .with_timeout(self.transport.get_snapshot(&peer))
                .await
            {
                Ok(snapshot) => return Some((peer, snapshot)),
                Err(err) => {
                    tracing::warn!(peer = %peer.base_url(), error = %err, "snapshot fetch failed");
                }
            }
        }
        None
    }

    /// Imports a peer snapshot in order, bypassing the hold-back queue.
    ///
    /// Every block is still verified. Blocks whose parent is absent (the
    /// peer's snapshot may be partial) and invalid blocks are skipped.
    /// Returns the number of blocks added.
    pub fn replay(&self, blocks: Vec<Block>) -> usize {
        let mut ledger = self.ledger.lock();
        let mut added = 0;
        for block in blocks {
            let id = block.data.id.clone();
            match ledger.engine.import_block(block) {
                Ok(Imported::Added) => {
                    added += 1;
                    self.metrics.ledger.blocks_accepted.inc();
                }
                Ok(Imported::AlreadyKnown) => {}
                Err(VerifyError::MissingAncestor { missing }) => {
                    tracing::debug!(%id, %missing, "skipping replayed orphan");
                }
                Err(err) => {
                    self.metrics.ledger.blocks_rejected.inc();
                    tracing::warn!(%id, error = %err, "skipping invalid replayed block");
                }
            }
        }
        added
    }

    /// Returns to normal and drains the hold-back queue in arrival order.
    ///
    /// If a drained block misses an ancestor, the node goes back to
    /// recovering with the rest of the queue and the missing id is returned.
    pub(crate) fn finish_recovery(&self) -> Option<BlockId> {
        let mut ledger = self.ledger.lock();
        let mut queue = match mem::take(&mut ledger.state) {
            SyncState::Recovering { queue } => queue,
            SyncState::Normal => VecDeque::new(),
        };

        while let Some(block) = queue.pop_front() {
            let id = block.data.id.clone();
            match ledger.engine.import_block(block) {
                Ok(Imported::Added) => self.metrics.ledger.blocks_accepted.inc(),
                Ok(Imported::AlreadyKnown) => {}
                Err(VerifyError::MissingAncestor { missing }) => {
                    tracing::info!(%id, %missing, queued = queue.len(), "queued block needs another recovery");
                    self.metrics.ledger.hold_back_queue.set(queue.len() as i64);
                    ledger.state = SyncState::Recovering { queue };
                    return Some(missing);
                }
                Err(err) => {
                    self.metrics.ledger.blocks_rejected.inc();
                    tracing::warn!(%id, error = %err, "rejected queued block");
                }
            }
        }

        self.metrics.ledger.hold_back_queue.set(0);
        tracing::info!("recovery finished");
        None
    }

    /// Pulls `peer`'s whole tree and replays it, as a node does once at
    /// startup. Returns the number of blocks added.
    pub async fn bootstrap_from(&self, peer: &Peer) -> Result<usize, TransportError> {
        let snapshot = self
            .with_timeout(self.transport.get_snapshot(peer))
            .await?;
        let added = self.replay(snapshot);
        tracing::info!(peer = %peer.base_url(), added, "bootstrapped from peer");
        Ok(added)
    }

    // ---- gossip ----

    /// One gossip round.
    ///
    /// Contacts up to `gossip_fanout` sampled peers concurrently: registers
    /// this node with each, asks for its peer list and merges the answer.
    /// A failing peer only costs its own exchange.
    pub async fn gossip_tick(&self) {
        let partners = self.sample_remote_peers(self.config.gossip_fanout);
        if partners.is_empty() {
            tracing::debug!("no peers to gossip with");
            return;
        }

        let mut exchanges = JoinSet::new();
        for partner in partners {
            let transport = self.transport.clone();
            let me = self.local.clone();
            let timeout = self.config.request_timeout;
            let count = self.config.peer_list_count;

            exchanges.spawn(async move {
                let exchange = async {
                    transport.register(&partner, &me).await?;
                    transport.get_peers(&partner, count).await
                };
                let result = tokio::time::timeout(timeout, exchange)
                    .await
                    .unwrap_or(Err(TransportError::Timeout));
                (partner, result)
            });
        }

        while let Some(joined) = exchanges.join_next().await {
            match joined {
                Ok((partner, Ok(list))) => self.merge_peers(partner, list),
                Ok((partner, Err(err))) => {
                    self.metrics.ledger.gossip_failures.inc();
                    tracing::warn!(peer = %partner.base_url(), error = %err, "gossip exchange failed");
                }
                Err(err) => {
                    self.metrics.ledger.gossip_failures.inc();
                    tracing::warn!(error = %err, "gossip task aborted");
                }
            }
        }
    }

    fn merge_peers(&self, partner: Peer, list: Vec<Peer>) {
        let mut peers = self.peers.lock();
        peers.register(partner);
        for mut peer in list {
            if !peer.same_endpoint(&self.local) {
                peer.is_master = false;
                peers.register(peer);
            }
        }
    }

    // ---- broadcast ----

    /// Fire-and-forget delivery of `block` to every live peer.
    ///
    /// One task per peer, each bounded by the request timeout. Failures are
    /// only logged; the gossip and recovery paths make up for lost sends.
    pub fn broadcast(&self, block: &Block) {
        let targets = self.live_remote_peers();
        tracing::debug!(id = %block.id(), peers = targets.len(), "broadcasting block");

        for peer in targets {
            let transport = self.transport.clone();
            let block = block.clone();
            let timeout = self.config.request_timeout;
            tokio::spawn(async move {
                let sent = tokio::time::timeout(timeout, transport.post_block(&peer, &block))
                    .await
                    .unwrap_or(Err(TransportError::Timeout));
                if let Err(err) = sent {
                    tracing::debug!(peer = %peer.base_url(), error = %err, "broadcast failed");
                }
            });
        }
    }

    // ---- read side ----

    pub fn snapshot(&self) -> Vec<Block> {
        self.ledger.lock().engine.tree().snapshot()
    }

    pub fn blocks_since(&self, id: &str) -> Vec<Block> {
        self.ledger.lock().engine.tree().blocks_since(id)
    }

    pub fn blocks_to(&self, id: &str, count: usize) -> Vec<Block> {
        self.ledger.lock().engine.tree().blocks_to(id, count)
    }

    pub fn head(&self) -> Option<Block> {
        self.ledger.lock().engine.tree().head().cloned()
    }

    pub fn is_recovering(&self) -> bool {
        self.ledger.lock().state.is_recovering()
    }

    /// Blocks currently held back by a running recovery.
    pub fn queued_blocks(&self) -> usize {
        self.ledger.lock().state.queue_len()
    }

    pub fn sample_peers(&self, count: usize) -> Vec<Peer> {
        self.peers.lock().sample_peers(count)
    }

    /// Records a peer announcement. Announcements of this node are ignored,
    /// and an announced peer is never a master.
    pub fn register_peer(&self, mut peer: Peer) -> bool {
        if peer.same_endpoint(&self.local) {
            return false;
        }
        peer.is_master = false;
        self.peers.lock().register(peer)
    }

    /// Records a configured bootstrap peer. Masters never expire.
    pub fn register_master(&self, mut peer: Peer) -> bool {
        if peer.same_endpoint(&self.local) {
            return false;
        }
        peer.is_master = true;
        self.peers.lock().register(peer)
    }

    fn sample_remote_peers(&self, count: usize) -> Vec<Peer> {
        // One spare draw in case this node made it into its own registry.
        let mut sampled = self.peers.lock().sample_peers(count + 1);
        sampled.retain(|p| !p.same_endpoint(&self.local));
        sampled.truncate(count);
        sampled
    }

    fn live_remote_peers(&self) -> Vec<Peer> {
        let mut live = self.peers.lock().live_peers();
        live.retain(|p| !p.same_endpoint(&self.local));
        live
    }

    async fn with_timeout<R>(
        &self,
        request: impl Future<Output = Result<R, TransportError>>,
    ) -> Result<R, TransportError> {
        tokio::time::timeout(self.config.request_timeout, request)
            .await
            .unwrap_or(Err(TransportError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{FakeTransport, chat_payload, mine_chain, mine_on, test_keys, user_payload};

    fn local() -> Peer {
        Peer::new("127.0.0.1", 8000, 90_000)
    }

    fn orchestrator(transport: Arc<FakeTransport>) -> Arc<SyncOrchestrator<FakeTransport>> {
        let config = SyncConfig {
            request_timeout: Duration::from_millis(100),
            ..SyncConfig::default()
        };
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        Arc::new(SyncOrchestrator::new(
            config,
            ConsensusConfig::default(),
            local(),
            transport,
            metrics,
        ))
    }

    fn record_ids(orch: &SyncOrchestrator<FakeTransport>) -> Arc<parking_lot::Mutex<Vec<String>>> {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        orch.listen(move |b| sink.lock().push(b.id().to_string()));
        seen
    }

    #[tokio::test]
    async fn submit_accepts_duplicates_and_rejects() {
        let orch = orchestrator(Arc::new(FakeTransport::default()));
        let keys = test_keys();
        let root = mine_on(None, user_payload(&keys, "alice"));

        assert_eq!(orch.submit(root.clone()).await, Ok(SubmitOutcome::Accepted));
        assert_eq!(orch.submit(root.clone()).await, Ok(SubmitOutcome::AlreadyApplied));

        let mut bad = mine_on(Some(&root), chat_payload(&keys, "alice", "x"));
        bad.hash = "000bad".to_string();
        assert!(matches!(
            orch.submit(bad).await,
            Err(SyncError::Rejected(VerifyError::HashMismatch { .. }))
        ));
        assert_eq!(orch.metrics.ledger.blocks_rejected.get(), 1);
        assert_eq!(orch.snapshot(), vec![root]);
    }

    #[tokio::test]
    async fn recovery_round_trip_pulls_the_missing_history() {
        let transport = Arc::new(FakeTransport::default());
        let remote = Peer::new("10.0.0.2", 8001, 90_000);
        let chain = mine_chain(3);
        transport.serve_chain(&remote, chain.clone());

        let orch = orchestrator(transport);
        orch.register_peer(remote);

        let tip = chain[2].clone();
        assert_eq!(orch.submit(tip.clone()).await, Ok(SubmitOutcome::RecoveryTriggered));

        assert!(!orch.is_recovering());
        assert_eq!(orch.snapshot(), chain);
        assert_eq!(orch.head(), Some(tip));
        assert_eq!(orch.metrics.ledger.recoveries.get(), 1);
    }

    #[tokio::test]
    async fn recovery_skips_peers_that_do_not_hold_the_block() {
        let transport = Arc::new(FakeTransport::default());
        let empty = Peer::new("10.0.0.3", 8001, 90_000);
        let down = Peer::new("10.0.0.4", 8001, 90_000);
        let holder = Peer::new("10.0.0.5", 8001, 90_000);
        let chain = mine_chain(2);
        transport.serve_chain(&empty, Vec::new());
        transport.set_down(&down);
        transport.serve_chain(&holder, chain.clone());

        let orch = orchestrator(transport);
        for p in [empty, down, holder] {
            orch.register_peer(p);
        }

        orch.submit(chain[1].clone()).await.unwrap();
        assert_eq!(orch.snapshot(), chain);
    }

    #[tokio::test]
    async fn exhausted_recovery_returns_to_normal() {
        let orch = orchestrator(Arc::new(FakeTransport::default()));
        let chain = mine_chain(2);

        assert_eq!(
            orch.submit(chain[1].clone()).await,
            Ok(SubmitOutcome::RecoveryTriggered)
        );
        assert!(!orch.is_recovering());
        assert!(orch.snapshot().is_empty());
    }

    #[tokio::test]
    async fn recovery_outlives_a_dropped_submitter() {
        let transport = Arc::new(FakeTransport::default());
        let slow = Peer::new("10.0.0.4", 8001, 90_000);
        transport.set_slow(&slow);
        let orch = orchestrator(transport);
        orch.register_peer(slow);

        let chain = mine_chain(3);
        let gave_up =
            tokio::time::timeout(Duration::from_millis(20), orch.submit(chain[2].clone())).await;
        assert!(gave_up.is_err());
        assert!(orch.is_recovering());

        // Held back while the slow probe is pending, applied once it times out.
        assert_eq!(orch.submit(chain[0].clone()).await, Ok(SubmitOutcome::Queued));
        for _ in 0..100 {
            if !orch.is_recovering() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!orch.is_recovering());
        assert_eq!(orch.queued_blocks(), 0);
        assert_eq!(orch.snapshot(), vec![chain[0].clone()]);
    }

    #[tokio::test]
    async fn blocks_are_held_back_and_drained_in_order() {
        let orch = orchestrator(Arc::new(FakeTransport::default()));
        let seen = record_ids(&orch);
        let chain = mine_chain(3);

        orch.with_ledger(|l| {
            l.state = SyncState::Recovering {
                queue: VecDeque::new(),
            }
        });
        for block in &chain {
            assert_eq!(orch.submit(block.clone()).await, Ok(SubmitOutcome::Queued));
        }
        assert_eq!(orch.metrics.ledger.hold_back_queue.get(), 3);
        assert_eq!(orch.queued_blocks(), 3);
        assert!(seen.lock().is_empty());

        assert_eq!(orch.finish_recovery(), None);
        let expected: Vec<String> = chain.iter().map(|b| b.id().to_string()).collect();
        assert_eq!(*seen.lock(), expected);
        assert!(!orch.is_recovering());
        assert_eq!(orch.metrics.ledger.hold_back_queue.get(), 0);
    }

    #[tokio::test]
    async fn drained_orphan_restarts_recovery_and_keeps_the_rest_queued() {
        let orch = orchestrator(Arc::new(FakeTransport::default()));
        let keys = test_keys();
        let chain = mine_chain(2);
        let unrelated = mine_on(None, user_payload(&keys, "bob"));

        orch.with_ledger(|l| {
            l.state = SyncState::Recovering {
                queue: VecDeque::from(vec![chain[1].clone(), unrelated.clone()]),
            }
        });

        assert_eq!(orch.finish_recovery(), Some(chain[0].id().to_string()));
        orch.with_ledger(|l| {
            assert_eq!(
                l.state,
                SyncState::Recovering {
                    queue: VecDeque::from(vec![unrelated.clone()])
                }
            );
        });

        assert_eq!(orch.finish_recovery(), None);
        assert_eq!(orch.snapshot(), vec![unrelated]);
    }

    #[tokio::test]
    async fn replay_verifies_and_skips_bad_blocks() {
        let orch = orchestrator(Arc::new(FakeTransport::default()));
        let mut chain = mine_chain(3);
        // Corrupt the middle block: its child becomes an orphan too.
        chain[1].data.nonce += 1;

        assert_eq!(orch.replay(chain.clone()), 1);
        assert_eq!(orch.snapshot(), vec![chain[0].clone()]);
    }

    #[tokio::test]
    async fn bootstrap_replays_the_peer_tree() {
        let transport = Arc::new(FakeTransport::default());
        let master = Peer::new("10.0.0.1", 8001, 90_000);
        let down = Peer::new("10.0.0.2", 8001, 90_000);
        let chain = mine_chain(3);
        transport.serve_chain(&master, chain.clone());
        transport.set_down(&down);

        let orch = orchestrator(transport);
        assert_eq!(orch.bootstrap_from(&master).await, Ok(3));
        assert_eq!(orch.snapshot(), chain);
        assert_eq!(orch.bootstrap_from(&master).await, Ok(0));
        assert!(orch.bootstrap_from(&down).await.is_err());
    }

    #[tokio::test]
    async fn gossip_isolates_failing_peers() {
        let transport = Arc::new(FakeTransport::default());
        let good = Peer::new("10.0.0.2", 8001, 90_000);
        let down = Peer::new("10.0.0.3", 8001, 90_000);
        let slow = Peer::new("10.0.0.4", 8001, 90_000);
        let discovered = Peer::new("10.0.0.9", 8001, 90_000);
        transport.serve_peers(&good, vec![discovered.clone(), local()]);
        transport.set_down(&down);
        transport.set_slow(&slow);

        let orch = orchestrator(transport.clone());
        for p in [&good, &down, &slow] {
            orch.register_peer(p.clone());
        }

        orch.gossip_tick().await;

        let mut hosts: Vec<String> = orch
            .sample_peers(10)
            .into_iter()
            .map(|p| p.address)
            .collect();
        hosts.sort();
        assert_eq!(hosts, vec!["10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.9"]);
        assert_eq!(orch.metrics.ledger.gossip_failures.get(), 2);
        assert!(transport.registrations().iter().all(|(_, me)| me.same_endpoint(&local())));
    }

    #[tokio::test]
    async fn only_configured_masters_outlive_their_ttl() {
        let transport = Arc::new(FakeTransport::default());
        let partner = Peer::new("10.0.0.2", 8001, 90_000);
        let mut gossiped = Peer::new("10.0.0.9", 8001, 1);
        gossiped.is_master = true;
        transport.serve_peers(&partner, vec![gossiped]);

        let orch = orchestrator(transport);
        let mut announced = Peer::new("10.0.0.3", 8001, 1);
        announced.is_master = true;
        orch.register_peer(announced);
        orch.register_master(Peer::new("10.0.0.1", 8001, 1));
        orch.register_peer(partner);
        orch.gossip_tick().await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        let mut hosts: Vec<String> = orch
            .sample_peers(10)
            .into_iter()
            .map(|p| p.address)
            .collect();
        hosts.sort();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_live_peer() {
        let transport = Arc::new(FakeTransport::default());
        let a = Peer::new("10.0.0.2", 8001, 90_000);
        let b = Peer::new("10.0.0.3", 8001, 90_000);
        let orch = orchestrator(transport.clone());
        orch.register_peer(a.clone());
        orch.register_peer(b.clone());
        // Announcements of ourselves never make it into the registry.
        assert!(!orch.register_peer(local()));

        let block = mine_chain(1).remove(0);
        orch.broadcast(&block);

        for _ in 0..50 {
            if transport.posted().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let mut targets: Vec<String> = transport
            .posted()
            .into_iter()
            .map(|(peer, posted)| {
                assert_eq!(posted, block);
                peer.address
            })
            .collect();
        targets.sort();
        assert_eq!(targets, vec!["10.0.0.2", "10.0.0.3"]);
    }
}
