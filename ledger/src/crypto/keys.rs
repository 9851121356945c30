//! RSA keypairs and content signatures.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::CryptoError;
use crate::types::{Content, SignedPayload};

/// An RSA keypair plus the cached PEM of its public half.
///
/// Used both by relays (to open onion layers and sign their `node`
/// advertisements) and by users (to sign chat and registration content).
#[derive(Clone)]
pub struct NodeKeys {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    public_pem: String,
}

impl NodeKeys {
    /// Generates a fresh keypair of `bits` size.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        Self::from_private(private)
    }

    /// Restores a keypair from a PKCS#8 PEM private key.
    pub fn from_private_pem(pem: &str) -> Result<Self, CryptoError> {
        let private =
            RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| CryptoError::Key(e.to_string()))?;
        Self::from_private(private)
    }

    fn from_private(private: RsaPrivateKey) -> Result<Self, CryptoError> {
        let public = RsaPublicKey::from(&private);
        let public_pem = public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Key(e.to_string()))?;
        Ok(Self {
            private,
            public,
            public_pem,
        })
    }

    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// PKCS#8 PEM encoding of the private key, for the keypair file.
    pub fn private_pem(&self) -> Result<String, CryptoError> {
        self.private
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| CryptoError::Key(e.to_string()))
    }

    /// Signs `message` (SHA-256, PKCS#1 v1.5) and returns the hex signature.
    pub fn sign(&self, message: &[u8]) -> Result<String, CryptoError> {
        let digest = Sha256::digest(message);
        let signature = self.private.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)?;
        Ok(hex::encode(signature))
    }

    /// Signs `content` and bundles it with this key into a payload ready
    /// for mining or onion routing.
    pub fn sign_content(&self, content: Content) -> Result<SignedPayload, CryptoError> {
        let signature = self.sign(&content.canonical_bytes())?;
        Ok(SignedPayload {
            content,
            signature,
            public_key: self.public_pem.clone(),
        })
    }
}

impl std::fmt::Debug for NodeKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeKeys")
            .field("public_pem", &self.public_pem)
            .finish_non_exhaustive()
    }
}

/// Parses a PKCS#8 PEM public key.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| CryptoError::Key(e.to_string()))
}

/// Checks a hex signature produced by [`NodeKeys::sign`] against `public_pem`.
pub fn verify_signature(
    public_pem: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<(), CryptoError> {
    let public = parse_public_key(public_pem)?;
    let signature = hex::decode(signature_hex)?;
    let digest = Sha256::digest(message);
    public
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
        .map_err(|_| CryptoError::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_keys, test_keys_alt};
    use crate::types::Chat;

    #[test]
    fn signature_round_trips_through_pem() {
        let keys = test_keys();
        let sig = keys.sign(b"payload").unwrap();
        assert!(verify_signature(keys.public_pem(), b"payload", &sig).is_ok());
        assert!(matches!(
            verify_signature(keys.public_pem(), b"tampered", &sig),
            Err(CryptoError::BadSignature)
        ));
    }

    #[test]
    fn signature_from_other_key_is_rejected() {
        let keys = test_keys();
        let other = test_keys_alt();
        let sig = other.sign(b"payload").unwrap();
        assert!(verify_signature(keys.public_pem(), b"payload", &sig).is_err());
    }

    #[test]
    fn private_pem_restores_the_same_public_key() {
        let keys = test_keys();
        let restored = NodeKeys::from_private_pem(&keys.private_pem().unwrap()).unwrap();
        assert_eq!(restored.public_pem(), keys.public_pem());
    }

    #[test]
    fn sign_content_covers_canonical_bytes() {
        let keys = test_keys();
        let content = Content::Chat(Chat {
            timestamp: 5,
            from: "alice".to_string(),
            message: "hi".to_string(),
        });
        let payload = keys.sign_content(content.clone()).unwrap();
        assert_eq!(payload.public_key, keys.public_pem());
        verify_signature(
            &payload.public_key,
            &content.canonical_bytes(),
            &payload.signature,
        )
        .unwrap();
    }

    #[test]
    fn garbage_pem_is_a_key_error() {
        assert!(matches!(
            verify_signature("not a key", b"x", "00"),
            Err(CryptoError::Key(_))
        ));
    }
}
