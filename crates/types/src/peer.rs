//! Peer identity.

use crate::PublicKey;
use sbor::prelude::BasicSbor;

/// A validating peer: long-lived key plus a reachable endpoint.
///
/// The endpoint is opaque to consensus; the transport layer interprets it.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Peer {
    /// The peer's Ed25519 identity.
    pub pubkey: PublicKey,
    /// Transport endpoint, e.g. `10.0.0.3:10001`.
    pub address: String,
}

impl Peer {
    /// Create a peer entry.
    pub fn new(pubkey: PublicKey, address: impl Into<String>) -> Self {
        Peer {
            pubkey,
            address: address.into(),
        }
    }
}
