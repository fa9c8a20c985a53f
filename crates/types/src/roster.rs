//! Peer roster: the agreed chain order and quorum arithmetic.
//!
//! The roster is the single source of truth for peer ordering. Every
//! validating peer holds the same ordered list, which defines the relay
//! chain `0 → 1 → … → N-1`: position 0 is the leader, positions `0..=2f`
//! form the nominal validating set A, and positions `2f+1..N` are the
//! fallback reservoir B.

use crate::{KeyPair, Peer, PublicKey};
use std::sync::Arc;
use thiserror::Error;

/// Errors from roster construction.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster must contain at least one peer")]
    Empty,

    #[error("Duplicate peer key in roster: {0}")]
    DuplicateKey(PublicKey),

    #[error("Local key {0} is not a member of the roster")]
    SelfNotMember(PublicKey),
}

/// An immutable snapshot of the active peer set in chain order.
///
/// Quorum parameters are always derived from the live peer count:
/// `f = ⌊(N-1)/3⌋` and `quorum = 2f+1`. Snapshots are cheap to share
/// (`Arc` internally) and readers never block each other.
#[derive(Debug, Clone)]
pub struct PeerRoster {
    peers: Arc<Vec<Peer>>,
    self_keypair: Arc<KeyPair>,
    self_position: usize,
}

impl PeerRoster {
    /// Build a roster from an unordered peer set.
    ///
    /// Peers are sorted lexicographically by public key bytes, the default
    /// globally-agreed ordering. Use [`PeerRoster::from_ordered`] when the
    /// deployment distributes an explicit order instead.
    pub fn new(mut peers: Vec<Peer>, self_keypair: KeyPair) -> Result<Self, RosterError> {
        peers.sort_by(|a, b| a.pubkey.as_bytes().cmp(b.pubkey.as_bytes()));
        Self::from_ordered(peers, self_keypair)
    }

    /// Build a roster from an explicitly ordered peer list.
    pub fn from_ordered(peers: Vec<Peer>, self_keypair: KeyPair) -> Result<Self, RosterError> {
        if peers.is_empty() {
            return Err(RosterError::Empty);
        }
        for (i, peer) in peers.iter().enumerate() {
            if peers[i + 1..].iter().any(|p| p.pubkey == peer.pubkey) {
                return Err(RosterError::DuplicateKey(peer.pubkey));
            }
        }
        let self_pubkey = self_keypair.public_key();
        let self_position = peers
            .iter()
            .position(|p| p.pubkey == self_pubkey)
            .ok_or(RosterError::SelfNotMember(self_pubkey))?;
        Ok(PeerRoster {
            peers: Arc::new(peers),
            self_keypair: Arc::new(self_keypair),
            self_position,
        })
    }

    /// Total number of active peers (N).
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// True when the roster holds no peers. Construction forbids this; the
    /// method exists for the `len`/`is_empty` pairing lint.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Maximum tolerated Byzantine peers: `f = ⌊(N-1)/3⌋`.
    pub fn max_faulty(&self) -> usize {
        (self.len() - 1) / 3
    }

    /// Signatures required for commit: `2f + 1`.
    pub fn quorum(&self) -> usize {
        2 * self.max_faulty() + 1
    }

    /// The peer at a chain position, if within bounds.
    pub fn peer_at(&self, position: usize) -> Option<&Peer> {
        self.peers.get(position)
    }

    /// The chain position of a public key, if it is an active peer.
    pub fn position_of(&self, pubkey: &PublicKey) -> Option<usize> {
        self.peers.iter().position(|p| &p.pubkey == pubkey)
    }

    /// Whether a key belongs to the active set.
    pub fn contains(&self, pubkey: &PublicKey) -> bool {
        self.position_of(pubkey).is_some()
    }

    /// The leader: position 0 in the chain order.
    pub fn leader(&self) -> &Peer {
        &self.peers[0]
    }

    /// This peer's chain position.
    pub fn self_position(&self) -> usize {
        self.self_position
    }

    /// This peer's signing keypair.
    pub fn self_keypair(&self) -> &KeyPair {
        &self.self_keypair
    }

    /// This peer's public key.
    pub fn self_pubkey(&self) -> PublicKey {
        self.self_keypair.public_key()
    }

    /// Iterate peers in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypairs(n: usize) -> Vec<KeyPair> {
        (0..n)
            .map(|i| KeyPair::from_seed(&[i as u8 + 1; 32]))
            .collect()
    }

    fn roster_of(n: usize) -> PeerRoster {
        let kps = keypairs(n);
        let peers: Vec<Peer> = kps
            .iter()
            .enumerate()
            .map(|(i, kp)| Peer::new(kp.public_key(), format!("peer-{i}")))
            .collect();
        PeerRoster::new(peers, kps.into_iter().next().unwrap()).unwrap()
    }

    #[test]
    fn quorum_arithmetic() {
        // (N, f, 2f+1)
        for (n, f, q) in [(1, 0, 1), (4, 1, 3), (7, 2, 5), (10, 3, 7), (13, 4, 9)] {
            let roster = roster_of(n);
            assert_eq!(roster.max_faulty(), f, "N={n}");
            assert_eq!(roster.quorum(), q, "N={n}");
        }
    }

    #[test]
    fn ordering_is_lexicographic_on_pubkey() {
        let roster = roster_of(5);
        let keys: Vec<&[u8; 32]> = roster.iter().map(|p| p.pubkey.as_bytes()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn positions_match_iteration_order() {
        let roster = roster_of(4);
        for (i, peer) in roster.iter().enumerate() {
            assert_eq!(roster.position_of(&peer.pubkey), Some(i));
            assert_eq!(roster.peer_at(i).unwrap().pubkey, peer.pubkey);
        }
        assert!(roster.peer_at(4).is_none());
    }

    #[test]
    fn leader_is_position_zero() {
        let roster = roster_of(4);
        assert_eq!(
            roster.leader().pubkey,
            roster.peer_at(0).unwrap().pubkey
        );
        assert!(roster.contains(&roster.self_pubkey()));
        let outsider = KeyPair::from_seed(&[200u8; 32]);
        assert!(!roster.contains(&outsider.public_key()));
    }

    #[test]
    fn self_position_resolves() {
        let kps = keypairs(4);
        let peers: Vec<Peer> = kps
            .iter()
            .map(|kp| Peer::new(kp.public_key(), "addr"))
            .collect();
        let me = kps[2].clone();
        let roster = PeerRoster::new(peers, me.clone()).unwrap();
        assert_eq!(
            roster.peer_at(roster.self_position()).unwrap().pubkey,
            me.public_key()
        );
    }

    #[test]
    fn rejects_duplicates_and_outsiders() {
        let kps = keypairs(3);
        let dup = vec![
            Peer::new(kps[0].public_key(), "a"),
            Peer::new(kps[0].public_key(), "b"),
        ];
        assert!(matches!(
            PeerRoster::new(dup, kps[0].clone()),
            Err(RosterError::DuplicateKey(_))
        ));

        let peers = vec![Peer::new(kps[0].public_key(), "a")];
        assert!(matches!(
            PeerRoster::new(peers, kps[1].clone()),
            Err(RosterError::SelfNotMember(_))
        ));

        assert!(matches!(
            PeerRoster::new(vec![], kps[0].clone()),
            Err(RosterError::Empty)
        ));
    }

    #[test]
    fn explicit_order_is_preserved() {
        let kps = keypairs(3);
        let mut peers: Vec<Peer> = kps
            .iter()
            .map(|kp| Peer::new(kp.public_key(), "addr"))
            .collect();
        peers.reverse();
        let expected: Vec<PublicKey> = peers.iter().map(|p| p.pubkey).collect();
        let roster = PeerRoster::from_ordered(peers, kps[0].clone()).unwrap();
        let actual: Vec<PublicKey> = roster.iter().map(|p| p.pubkey).collect();
        assert_eq!(actual, expected);
    }
}
