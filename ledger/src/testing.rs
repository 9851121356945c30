//! Shared fixtures for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::consensus::{BlockTree, Miner};
use crate::crypto::NodeKeys;
use crate::onion::OnionRequest;
use crate::registry::Endpoint;
use crate::sync::{PeerTransport, TransportError};
use crate::types::{Block, Chat, Content, Peer, SignedPayload, User, now_ms};

// Small keys keep RSA generation and onion layers fast in debug builds.
const TEST_KEY_BITS: usize = 1024;

fn cached(cell: &'static OnceLock<NodeKeys>) -> NodeKeys {
    cell.get_or_init(|| NodeKeys::generate(TEST_KEY_BITS).expect("generate test key"))
        .clone()
}

pub(crate) fn test_keys() -> NodeKeys {
    static KEYS: OnceLock<NodeKeys> = OnceLock::new();
    cached(&KEYS)
}

pub(crate) fn test_keys_alt() -> NodeKeys {
    static KEYS: OnceLock<NodeKeys> = OnceLock::new();
    cached(&KEYS)
}

pub(crate) fn test_keys_third() -> NodeKeys {
    static KEYS: OnceLock<NodeKeys> = OnceLock::new();
    cached(&KEYS)
}

pub(crate) fn chat_payload(keys: &NodeKeys, from: &str, message: &str) -> SignedPayload {
    keys.sign_content(Content::Chat(Chat {
        timestamp: now_ms(),
        from: from.to_string(),
        message: message.to_string(),
    }))
    .expect("sign chat")
}

pub(crate) fn user_payload(keys: &NodeKeys, name: &str) -> SignedPayload {
    keys.sign_content(Content::User(User {
        timestamp: now_ms(),
        name: name.to_string(),
        public_key: keys.public_pem().to_string(),
    }))
    .expect("sign user")
}

/// Mines `payload` on top of `parent` without consulting any tree.
pub(crate) fn mine_on(parent: Option<&Block>, payload: SignedPayload) -> Block {
    Miner.solve(Miner.prepare(parent, payload))
}

/// A valid linear chain: alice registers, then posts `len - 1` chats.
pub(crate) fn mine_chain(len: usize) -> Vec<Block> {
    let keys = test_keys();
    let mut chain: Vec<Block> = Vec::with_capacity(len);
    for i in 0..len {
        let payload = if i == 0 {
            user_payload(&keys, "alice")
        } else {
            chat_payload(&keys, "alice", &format!("message {i}"))
        };
        let block = mine_on(chain.last(), payload);
        chain.push(block);
    }
    chain
}

fn endpoint(peer: &Peer) -> Endpoint {
    (peer.address.clone(), peer.port)
}

#[derive(Default)]
struct FakeState {
    chains: HashMap<Endpoint, Vec<Block>>,
    peer_lists: HashMap<Endpoint, Vec<Peer>>,
    down: HashSet<Endpoint>,
    slow: HashSet<Endpoint>,
    posted: Vec<(Peer, Block)>,
    registrations: Vec<(Peer, Peer)>,
    onion: Vec<(String, OnionRequest)>,
}

/// In-memory [`PeerTransport`]: peers are scripted, requests are recorded.
#[derive(Default)]
pub(crate) struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub(crate) fn serve_chain(&self, peer: &Peer, blocks: Vec<Block>) {
        self.state.lock().chains.insert(endpoint(peer), blocks);
    }

    pub(crate) fn serve_peers(&self, peer: &Peer, peers: Vec<Peer>) {
        self.state.lock().peer_lists.insert(endpoint(peer), peers);
    }

    /// Every request to `peer` fails immediately.
    pub(crate) fn set_down(&self, peer: &Peer) {
        self.state.lock().down.insert(endpoint(peer));
    }

    /// Every request to `peer` hangs until the caller's timeout.
    pub(crate) fn set_slow(&self, peer: &Peer) {
        self.state.lock().slow.insert(endpoint(peer));
    }

    pub(crate) fn posted(&self) -> Vec<(Peer, Block)> {
        self.state.lock().posted.clone()
    }

    pub(crate) fn registrations(&self) -> Vec<(Peer, Peer)> {
        self.state.lock().registrations.clone()
    }

    pub(crate) fn onion_requests(&self) -> Vec<(String, OnionRequest)> {
        self.state.lock().onion.clone()
    }

    async fn reach(&self, peer: &Peer) -> Result<(), TransportError> {
        let (down, slow) = {
            let state = self.state.lock();
            let key = endpoint(peer);
            (state.down.contains(&key), state.slow.contains(&key))
        };
        if down {
            return Err(TransportError::Http("connection refused".to_string()));
        }
        if slow {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return Err(TransportError::Timeout);
        }
        Ok(())
    }

    fn chain_of(&self, peer: &Peer) -> Vec<Block> {
        self.state
            .lock()
            .chains
            .get(&endpoint(peer))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PeerTransport for FakeTransport {
    async fn post_block(&self, peer: &Peer, block: &Block) -> Result<(), TransportError> {
        self.reach(peer).await?;
        self.state.lock().posted.push((peer.clone(), block.clone()));
        Ok(())
    }

    async fn get_snapshot(&self, peer: &Peer) -> Result<Vec<Block>, TransportError> {
        self.reach(peer).await?;
        Ok(self.chain_of(peer))
    }

    async fn get_blocks_to(
        &self,
        peer: &Peer,
        id: &str,
        count: usize,
    ) -> Result<Vec<Block>, TransportError> {
        self.reach(peer).await?;
        let mut tree = BlockTree::new();
        for block in self.chain_of(peer) {
            tree.add_block(block).expect("scripted chain is well-formed");
        }
        Ok(tree.blocks_to(id, count))
    }

    async fn get_peers(&self, peer: &Peer, count: usize) -> Result<Vec<Peer>, TransportError> {
        self.reach(peer).await?;
        let mut peers = self
            .state
            .lock()
            .peer_lists
            .get(&endpoint(peer))
            .cloned()
            .unwrap_or_default();
        peers.truncate(count);
        Ok(peers)
    }

    async fn register(&self, peer: &Peer, me: &Peer) -> Result<(), TransportError> {
        self.reach(peer).await?;
        self.state
            .lock()
            .registrations
            .push((peer.clone(), me.clone()));
        Ok(())
    }

    async fn send_onion(
        &self,
        address: &str,
        request: &OnionRequest,
    ) -> Result<(), TransportError> {
        self.state
            .lock()
            .onion
            .push((address.to_string(), request.clone()));
        Ok(())
    }
}
