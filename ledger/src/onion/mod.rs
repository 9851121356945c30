//! Three-hop onion circuits.
//!
//! A client picks three live relays and wraps its signed payload inside
//! out: the exit layer (holding the payload) is encrypted for the third
//! relay, that ciphertext goes into a relay layer pointing at the third
//! relay and encrypted for the second, and so on. Every relay can peel
//! exactly one layer and learns only the next hop, and only the exit sees
//! the payload.
//!
//! Layers are JSON, tagged by `"kind"`:
//!
//! ```json
//! {"kind":"relay","next":"10.0.0.3:8002","encrypted":"<hex>"}
//! {"kind":"exit","content":{"content":{...},"signature":"...","public_key":"..."}}
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{CryptoError, NodeKeys, decrypt, encrypt_for};
use crate::registry::NodeRegistry;
use crate::sync::{PeerTransport, TransportError};
use crate::types::{OnionNode, SignedPayload};

/// Number of relays in a circuit.
pub const CIRCUIT_HOPS: usize = 3;

/// One decrypted layer of an onion request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Layer {
    /// Forward `encrypted` to `next` (`host:port`).
    Relay { next: String, encrypted: String },
    /// Innermost layer: the payload to mine.
    Exit { content: SignedPayload },
}

/// Body of `POST /request`: one still-encrypted layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnionRequest {
    pub encrypted: String,
}

#[derive(Debug, Error)]
pub enum OnionError {
    #[error("need {needed} live relays, only {available} known")]
    NotEnoughRelays { available: usize, needed: usize },

    /// The layer was not addressed to this relay's key, or is corrupt.
    #[error("layer cannot be decrypted with this relay's key")]
    Decrypt,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("malformed layer: {0}")]
    Format(#[from] serde_json::Error),

    #[error("could not reach the next hop: {0}")]
    Transport(#[from] TransportError),
}

/// Wraps `payload` for the circuit `hops` (entry first, exit last).
///
/// Returns the entry relay's address and the request to send it.
pub fn build_circuit(
    payload: &SignedPayload,
    hops: &[OnionNode],
) -> Result<(String, OnionRequest), OnionError> {
    let Some((exit, rest)) = hops.split_last() else {
        return Err(OnionError::NotEnoughRelays {
            available: 0,
            needed: 1,
        });
    };

    let exit_layer = Layer::Exit {
        content: payload.clone(),
    };
    let mut encrypted = encrypt_for(&exit.public_key, &serde_json::to_vec(&exit_layer)?)?;
    let mut next = exit.address();

    for hop in rest.iter().rev() {
        let layer = Layer::Relay { next, encrypted };
        encrypted = encrypt_for(&hop.public_key, &serde_json::to_vec(&layer)?)?;
        next = hop.address();
    }

    // After the loop `next` is the entry relay.
    Ok((next, OnionRequest { encrypted }))
}

/// Decrypts the outermost layer of `request` with this relay's keys.
pub fn peel(request: &OnionRequest, keys: &NodeKeys) -> Result<Layer, OnionError> {
    let plaintext = decrypt(keys, &request.encrypted).map_err(|_| OnionError::Decrypt)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Client and relay side of onion routing.
pub struct OnionRouter<T> {
    nodes: Arc<Mutex<NodeRegistry>>,
    transport: Arc<T>,
}

impl<T: PeerTransport> OnionRouter<T> {
    pub fn new(nodes: Arc<Mutex<NodeRegistry>>, transport: Arc<T>) -> Self {
        Self { nodes, transport }
    }

    /// Sends `payload` through three distinct, randomly chosen live relays.
    /// Returns the entry relay's address.
    pub async fn route(&self, payload: &SignedPayload) -> Result<String, OnionError> {
        let hops = self.nodes.lock().sample_nodes(CIRCUIT_HOPS);
        if hops.len() < CIRCUIT_HOPS {
            return Err(OnionError::NotEnoughRelays {
                available: hops.len(),
                needed: CIRCUIT_HOPS,
            });
        }

        let (entry, request) = build_circuit(payload, &hops)?;
        tracing::debug!(%entry, "sending onion request");
        self.transport.send_onion(&entry, &request).await?;
        Ok(entry)
    }

    /// Relays an already peeled layer to the next hop.
    pub async fn forward(&self, next: &str, encrypted: String) -> Result<(), OnionError> {
        tracing::debug!(%next, "forwarding onion layer");
        self.transport
            .send_onion(next, &OnionRequest { encrypted })
            .await?;
        Ok(())
    }
}
