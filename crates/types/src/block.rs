//! Block, header, and signature chain types.

use crate::{unix_time_millis, Hash, KeyPair, PublicKey, Signature};
use sbor::prelude::BasicSbor;

/// Position of a block in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
pub struct BlockHeight(pub u64);

/// An opaque transaction payload.
///
/// Consensus never interprets transaction contents; bodies are byte
/// sequences end to end (embedded NUL bytes included).
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Transaction(pub Vec<u8>);

/// The payload half of a block: what gets hashed and signed.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct BlockBody {
    /// Position this block claims in the chain.
    pub height: BlockHeight,
    /// Ordered opaque transactions.
    pub transactions: Vec<Transaction>,
}

impl BlockBody {
    /// Canonical deterministic encoding of the body.
    ///
    /// Peers that disagree on these bytes produce non-matching digests and
    /// lose quorum, so this must stay byte-stable across versions.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        sbor::basic_encode(self).expect("block body encoding is infallible")
    }

    /// SHA3-256 digest of the canonical body encoding.
    pub fn digest(&self) -> Hash {
        Hash::sha3_256(&self.canonical_bytes())
    }
}

/// A single peer's signature over a block body digest.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct PeerSignature {
    /// Signer's public key.
    pub pubkey: PublicKey,
    /// Signature over the hex rendering of the body digest.
    pub signature: Signature,
}

/// Consensus metadata: signing chain and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct BlockHeader {
    /// Unix millis stamped by the most recent signer.
    pub created_time: u64,
    /// Signatures accumulated along the relay chain, in signing order.
    pub peer_signatures: Vec<PeerSignature>,
}

/// The unit of ordered replication.
///
/// A block is immutable once signed: extending the signature chain produces
/// a new block value (see [`Block::signed_by`]). Identity is content-based —
/// the digest of the body — so two values that differ only in signatures or
/// timestamp refer to the same block.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Block {
    /// Consensus metadata.
    pub header: BlockHeader,
    /// The signed payload.
    pub body: BlockBody,
}

impl Block {
    /// Create an unsigned block around a body.
    pub fn new(body: BlockBody) -> Self {
        Block {
            header: BlockHeader {
                created_time: 0,
                peer_signatures: Vec::new(),
            },
            body,
        }
    }

    /// Block identity: the body digest.
    pub fn id(&self) -> Hash {
        self.body.digest()
    }

    /// The height the body claims.
    pub fn height(&self) -> BlockHeight {
        self.body.height
    }

    /// Number of signature entries, counting duplicates and invalid entries.
    pub fn signature_count(&self) -> usize {
        self.header.peer_signatures.len()
    }

    /// Produce a new block value extended with this peer's signature over
    /// `payload`, stamping the header timestamp.
    pub fn signed_by(&self, keypair: &KeyPair, payload: &[u8]) -> Block {
        let mut next = self.clone();
        next.header.created_time = unix_time_millis();
        next.header.peer_signatures.push(PeerSignature {
            pubkey: keypair.public_key(),
            signature: keypair.sign(payload),
        });
        next
    }
}
