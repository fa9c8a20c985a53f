//! Ed25519 keys and signatures.
//!
//! Thin wrappers around `ed25519-dalek` so the rest of the workspace never
//! handles raw curve types. Verification never panics: malformed keys or
//! signatures simply fail to verify.

use ed25519_dalek::{Signer, Verifier};
use rand::rngs::OsRng;
use sbor::prelude::BasicSbor;
use std::fmt;
use thiserror::Error;

/// Errors from key material handling.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid public key bytes: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid secret key bytes: {0}")]
    InvalidSecretKey(String),

    #[error("Invalid signature bytes: {0}")]
    InvalidSignature(String),
}

/// An Ed25519 public key.
///
/// The byte ordering of public keys defines the default chain order of a
/// [`crate::PeerRoster`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Construct from raw key bytes.
    ///
    /// Validity against the curve is checked at verification time, not here:
    /// a roster may legitimately carry a peer whose key later proves
    /// malformed, and its signatures then never count.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        PublicKey(bytes)
    }

    /// Parse a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey("wrong length".into()))?;
        Ok(PublicKey(arr))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify `signature` over `message` under this key.
    ///
    /// Returns `false` for malformed keys or signatures as well as for honest
    /// mismatches; the caller cannot distinguish the two and must not need to.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(key) = ed25519_dalek::PublicKey::from_bytes(&self.0) else {
            return false;
        };
        let Ok(sig) = ed25519_dalek::Signature::from_bytes(&signature.0) else {
            return false;
        };
        key.verify(message, &sig).is_ok()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}..)", &self.to_hex()[..8])
    }
}

/// An Ed25519 signature.
#[derive(Clone, Copy, BasicSbor)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Construct from raw signature bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Signature(bytes)
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.0[..] == other.0[..]
    }
}

impl Eq for Signature {}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..8])
    }
}

/// A long-lived Ed25519 signing keypair.
pub struct KeyPair {
    inner: ed25519_dalek::Keypair,
}

impl KeyPair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        KeyPair {
            inner: ed25519_dalek::Keypair::generate(&mut OsRng),
        }
    }

    /// Derive a keypair deterministically from a 32-byte seed.
    ///
    /// Used by tests to build reproducible rosters.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let secret = ed25519_dalek::SecretKey::from_bytes(seed)
            .expect("32-byte seed is a valid ed25519 secret");
        let public = ed25519_dalek::PublicKey::from(&secret);
        KeyPair {
            inner: ed25519_dalek::Keypair { secret, public },
        }
    }

    /// Reconstruct a keypair from a stored secret key.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = ed25519_dalek::SecretKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        let public = ed25519_dalek::PublicKey::from(&secret);
        Ok(KeyPair {
            inner: ed25519_dalek::Keypair { secret, public },
        })
    }

    /// The public half of this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.inner.public.to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes())
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        // Keypair bytes always round-trip: the secret is exactly 32 bytes.
        let secret = ed25519_dalek::SecretKey::from_bytes(self.inner.secret.as_bytes())
            .expect("secret key bytes round-trip");
        let public = ed25519_dalek::PublicKey::from(&secret);
        KeyPair {
            inner: ed25519_dalek::Keypair { secret, public },
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}
