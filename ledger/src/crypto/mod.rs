//! RSA primitives used by the ledger.
//!
//! - [`keys`]: node/user keypairs, PKCS#1 v1.5 signatures over content.
//! - [`envelope`]: chunked RSA-OAEP encryption used for onion layers.
//! - [`keyfile`]: the per-node keypair file, loaded or generated at startup.
//!
//! Public keys travel as PKCS#8 PEM strings and every binary blob
//! (signatures, ciphertexts) as lowercase hex.

use thiserror::Error;

pub mod envelope;
pub mod keyfile;
pub mod keys;

pub use envelope::{decrypt, encrypt_for};
pub use keyfile::{KeyFile, KeyFileError, load_or_generate};
pub use keys::{NodeKeys, verify_signature};

/// Errors raised by key handling, signing and envelope encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// PEM could not be parsed or encoded.
    #[error("invalid key: {0}")]
    Key(String),

    /// Key generation, signing or encryption failed inside `rsa`.
    #[error("rsa operation failed: {0}")]
    Rsa(#[from] rsa::Error),

    /// A hex field (signature or ciphertext) was malformed.
    #[error("invalid hex encoding: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Signature does not verify under the given key.
    #[error("signature verification failed")]
    BadSignature,

    /// Ciphertext was not produced for this key.
    #[error("envelope cannot be opened with this key")]
    Decrypt,
}
