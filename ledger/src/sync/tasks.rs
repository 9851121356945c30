//! Background tasks driving the orchestrator.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::orchestrator::SyncOrchestrator;
use super::transport::PeerTransport;
use crate::types::Block;

/// Runs [`SyncOrchestrator::gossip_tick`] every `gossip_interval`, starting
/// immediately.
pub fn spawn_gossip<T: PeerTransport>(orchestrator: Arc<SyncOrchestrator<T>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(orchestrator.config().gossip_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            orchestrator.gossip_tick().await;
        }
    })
}

/// Broadcasts every block received on `accepted` to the live peers.
///
/// Pair it with a tree listener that forwards accepted blocks into the
/// channel's sender; the task ends when every sender is dropped.
pub fn spawn_broadcaster<T: PeerTransport>(
    orchestrator: Arc<SyncOrchestrator<T>>,
    mut accepted: mpsc::UnboundedReceiver<Block>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(block) = accepted.recv().await {
            orchestrator.broadcast(&block);
        }
        tracing::debug!("broadcast channel closed");
    })
}

/// Forwards newly accepted blocks into a channel feeding
/// [`spawn_broadcaster`].
pub fn forward_accepted<T: PeerTransport>(
    orchestrator: &SyncOrchestrator<T>,
) -> mpsc::UnboundedReceiver<Block> {
    let (tx, rx) = mpsc::unbounded_channel();
    orchestrator.listen(move |block| {
        // Closed only at shutdown.
        let _ = tx.send(block.clone());
    });
    rx
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::SyncConfig;
    use crate::consensus::ConsensusConfig;
    use crate::metrics::MetricsRegistry;
    use crate::testing::{FakeTransport, mine_chain};
    use crate::types::Peer;

    fn orchestrator(transport: Arc<FakeTransport>, interval: Duration) -> Arc<SyncOrchestrator<FakeTransport>> {
        let config = SyncConfig {
            gossip_interval: interval,
            request_timeout: Duration::from_millis(100),
            ..SyncConfig::default()
        };
        Arc::new(SyncOrchestrator::new(
            config,
            ConsensusConfig::default(),
            Peer::new("127.0.0.1", 8000, 90_000),
            transport,
            Arc::new(MetricsRegistry::new().unwrap()),
        ))
    }

    async fn wait_for(mut done: impl FnMut() -> bool) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn accepted_blocks_are_broadcast() {
        let transport = Arc::new(FakeTransport::default());
        let orch = orchestrator(transport.clone(), Duration::from_secs(3600));
        orch.register_peer(Peer::new("10.0.0.2", 8001, 90_000));

        let rx = forward_accepted(&orch);
        let handle = spawn_broadcaster(orch.clone(), rx);

        let chain = mine_chain(2);
        for block in &chain {
            orch.submit(block.clone()).await.unwrap();
        }
        // Duplicates are not accepted again, so they are not re-sent.
        orch.submit(chain[0].clone()).await.unwrap();

        wait_for(|| transport.posted().len() == 2).await;
        let mut posted: Vec<_> = transport.posted().into_iter().map(|(_, b)| b).collect();
        posted.sort_by_key(|b| b.data.sequence);
        assert_eq!(posted, chain);
        handle.abort();
    }

    #[tokio::test]
    async fn gossip_runs_periodically() {
        let transport = Arc::new(FakeTransport::default());
        let partner = Peer::new("10.0.0.2", 8001, 90_000);
        transport.serve_peers(&partner, Vec::new());
        let orch = orchestrator(transport.clone(), Duration::from_millis(20));
        orch.register_peer(partner);

        let handle = spawn_gossip(orch);
        wait_for(|| transport.registrations().len() >= 2).await;
        assert!(transport.registrations().len() >= 2);
        handle.abort();
    }
}
