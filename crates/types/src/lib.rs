//! Core types for Sumeragi consensus.
//!
//! This crate provides the foundational types used throughout the consensus
//! implementation:
//!
//! - **Primitives**: SHA3-256 [`Hash`], Ed25519 keys and signatures
//! - **Consensus types**: [`Block`], [`BlockHeader`], [`PeerSignature`]
//! - **Peer directory**: [`Peer`], [`PeerRoster`] (chain order + quorum math)
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer.

mod block;
mod crypto;
mod hash;
mod peer;
mod roster;

pub use block::{Block, BlockBody, BlockHeader, BlockHeight, PeerSignature, Transaction};
pub use crypto::{CryptoError, KeyPair, PublicKey, Signature};
pub use hash::{Hash, HexError};
pub use peer::Peer;
pub use roster::{PeerRoster, RosterError};

/// Current unix time in milliseconds.
///
/// Block headers carry millisecond timestamps stamped at signing time.
pub fn unix_time_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
