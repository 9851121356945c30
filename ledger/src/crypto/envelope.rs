//! Chunked RSA-OAEP envelopes.
//!
//! An RSA key can only encrypt a message shorter than its modulus, while an
//! onion layer wraps the (already encrypted) layer below it and grows with
//! every hop. The plaintext is therefore split into chunks that each fit a
//! single OAEP block, every chunk is encrypted independently, and the
//! ciphertext blocks are concatenated. Each ciphertext block is exactly the
//! modulus size, so the receiver can split the envelope back without any
//! framing.

use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

use super::CryptoError;
use super::keys::{NodeKeys, parse_public_key};

/// OAEP overhead in bytes for SHA-256: two digests plus two marker bytes.
const OAEP_SHA256_OVERHEAD: usize = 2 * 32 + 2;

/// Encrypts `plaintext` for the holder of `public_pem`, returning hex.
pub fn encrypt_for(public_pem: &str, plaintext: &[u8]) -> Result<String, CryptoError> {
    let public = parse_public_key(public_pem)?;
    encrypt_with(&public, plaintext)
}

fn encrypt_with(public: &RsaPublicKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    let block_len = public.size();
    let chunk_len = block_len
        .checked_sub(OAEP_SHA256_OVERHEAD)
        .filter(|len| *len > 0)
        .ok_or_else(|| CryptoError::Key(format!("{}-byte modulus is too small", block_len)))?;

    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(plaintext.len().div_ceil(chunk_len).max(1) * block_len);

    // An empty plaintext still produces one block so the envelope is never empty.
    if plaintext.is_empty() {
        out.extend(public.encrypt(&mut rng, Oaep::new::<Sha256>(), &[])?);
    }
    for chunk in plaintext.chunks(chunk_len) {
        out.extend(public.encrypt(&mut rng, Oaep::new::<Sha256>(), chunk)?);
    }

    Ok(hex::encode(out))
}

/// Opens a hex envelope produced by [`encrypt_for`] with `keys`.
///
/// Fails with [`CryptoError::Decrypt`] if the envelope was addressed to any
/// other key.
pub fn decrypt(keys: &NodeKeys, envelope_hex: &str) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = hex::decode(envelope_hex)?;
    let block_len = keys.public_key().size();
    if ciphertext.is_empty() || ciphertext.len() % block_len != 0 {
        return Err(CryptoError::Decrypt);
    }

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    for block in ciphertext.chunks(block_len) {
        let chunk = keys
            .private_key()
            .decrypt(Oaep::new::<Sha256>(), block)
            .map_err(|_| CryptoError::Decrypt)?;
        plaintext.extend(chunk);
    }
    Ok(plaintext)
}
