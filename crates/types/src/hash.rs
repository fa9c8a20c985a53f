//! SHA3-256 content hash.

use sbor::prelude::BasicSbor;
use sha3::{Digest, Sha3_256};
use std::fmt;
use thiserror::Error;

/// Errors from parsing a hex-encoded hash.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Wrong digest length: expected 32 bytes, got {0}")]
    WrongLength(usize),
}

/// A 32-byte SHA3-256 digest.
///
/// Used both as the content hash of block bodies (the message peers sign)
/// and as block identity: a block is identified by the digest of its body,
/// so appending signatures never changes identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The all-zero hash.
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Hash arbitrary bytes with SHA3-256.
    pub fn sha3_256(bytes: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Hash(out)
    }

    /// Construct from raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Parse a hex-encoded digest.
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        let bytes = hex::decode(s).map_err(|e| HexError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(HexError::WrongLength(bytes.len()));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Hash(out))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex rendering of the digest.
    ///
    /// The hex string is also the byte message peers sign: signatures are
    /// made over `sha3_256_hex(body)` rather than the raw digest, matching
    /// the wire-compatible upstream convention.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps tracing output readable.
        write!(f, "Hash({}..)", &self.to_hex()[..8])
    }
}
