//! Deduplicated counting of valid peer signatures on a block.
//!
//! Pure functions over block values: the same block always yields the same
//! count, regardless of which peer asks or when.

use std::collections::HashSet;
use sumeragi_types::{Block, PeerRoster, PublicKey};

/// Count distinct roster members with a valid signature on `block`.
///
/// Walks the signature chain in order. An entry is counted when all of:
/// - its key has not been counted yet (duplicates are ignored, not rejected),
/// - its key belongs to the active roster (unknown signers are ignored so a
///   Byzantine peer cannot inflate the count with keys outside the agreed
///   validator set),
/// - the signature verifies against the hex rendering of the body digest.
pub fn count_valid(block: &Block, roster: &PeerRoster) -> usize {
    let message = block.body.digest().to_hex();
    let message = message.as_bytes();

    let mut counted: HashSet<PublicKey> = HashSet::new();
    for entry in &block.header.peer_signatures {
        if counted.contains(&entry.pubkey) {
            continue;
        }
        if !roster.contains(&entry.pubkey) {
            continue;
        }
        if entry.pubkey.verify(message, &entry.signature) {
            counted.insert(entry.pubkey);
        }
    }
    counted.len()
}

/// Whether a block is leader-originated: exactly one valid signature, the
/// first hop in the chain.
///
/// Counting signatures is a proxy for consulting a leader schedule; a leader
/// that omits its own signature defeats it. Hardening this means comparing
/// the first signer against the roster's leader, which is why the roster is
/// already in the signature.
pub fn is_leader_originated(block: &Block, roster: &PeerRoster) -> bool {
    count_valid(block, roster) == 1
}
