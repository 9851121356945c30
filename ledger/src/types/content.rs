//! Block payloads.
//!
//! Every block carries exactly one [`Content`] value. The enum is tagged on
//! the wire with a `"type"` field (`"chat"`, `"user"` or `"node"`), and the
//! canonical serialization of the content alone is what senders sign.

use serde::{Deserialize, Serialize};

/// A chat message posted by a registered (or not yet registered) user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Display name the sender claims.
    pub from: String,
    pub message: String,
}

/// Registration of a display name for a public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub timestamp: u64,
    pub name: String,
    /// PKCS#8 PEM public key the name is bound to.
    pub public_key: String,
}

/// Advertisement of an onion relay.
///
/// Relays re-mine one of these periodically; the `timestamp` of the newest
/// advertisement is what keeps the relay alive in the node registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnionNode {
    pub timestamp: u64,
    pub host: String,
    pub port: u16,
    /// PKCS#8 PEM public key layers addressed to this relay are encrypted with.
    pub public_key: String,
}

impl OnionNode {
    /// `host:port` form used as the `next` hop in relay layers.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tagged union of all block payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Chat(Chat),
    User(User),
    #[serde(rename = "node")]
    OnionNode(OnionNode),
}

impl Content {
    /// Canonical byte form of the content, used for signing and verification.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Derived Serialize on plain structs with string keys cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Chat(_) => "chat",
            Content::User(_) => "user",
            Content::OnionNode(_) => "node",
        }
    }
}

/// A content value together with its author's signature and public key.
///
/// This is what a client hands to the onion circuit, what the exit relay
/// hands to the miner, and what ends up (split into fields) inside
/// [`BlockData`](super::BlockData).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    pub content: Content,
    /// Hex-encoded RSA PKCS#1 v1.5 / SHA-256 signature over
    /// [`Content::canonical_bytes`].
    pub signature: String,
    /// PKCS#8 PEM public key of the signer.
    pub public_key: String,
}
