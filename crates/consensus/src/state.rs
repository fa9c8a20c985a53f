//! The block-processing state machine.
//!
//! One handler call per event, synchronous, I/O-free. Handlers take `&self`
//! and are safe to run concurrently on pool workers: the only shared state is
//! the per-block relay registry behind a short-lived lock, everything else is
//! read-only snapshots or collaborator calls.

use crate::{signatures, RelayBook, SumeragiConfig};
use std::sync::Arc;
use sumeragi_core::{Action, Event, Ledger, StatefulValidator};
use sumeragi_types::{Block, PeerRoster};
use tracing::{debug, error, info, trace, warn};

/// The per-peer consensus state machine.
///
/// Processes an inbound proposed block, validates it, signs it, and advances
/// it along the chain or emits a commit; on timer expiry, extends the
/// validating set by one position and re-issues the block.
pub struct SumeragiState {
    /// Agreed chain order and quorum arithmetic.
    roster: PeerRoster,

    /// Stateful transaction validation.
    validator: Arc<dyn StatefulValidator>,

    /// Block store: tentative appends, committed set, finalization.
    ledger: Arc<dyn Ledger>,

    /// Per-block relay cursors (proxy tails).
    relay: RelayBook,

    config: SumeragiConfig,
}

impl SumeragiState {
    /// Create a new state machine.
    pub fn new(
        roster: PeerRoster,
        validator: Arc<dyn StatefulValidator>,
        ledger: Arc<dyn Ledger>,
        config: SumeragiConfig,
    ) -> Self {
        Self {
            roster,
            validator,
            ledger,
            relay: RelayBook::new(),
            config,
        }
    }

    /// The roster snapshot this state machine runs against.
    pub fn roster(&self) -> &PeerRoster {
        &self.roster
    }

    /// Whether a block identity has already been committed locally.
    ///
    /// O(1); the dispatcher calls this on the transport thread before
    /// spending a worker on the block.
    pub fn is_committed(&self, block_id: &sumeragi_types::Hash) -> bool {
        self.ledger.is_committed(block_id)
    }

    /// Dispatch an event to its handler.
    pub fn handle(&self, event: Event) -> Vec<Action> {
        match event {
            Event::ProposalReceived { block } => self.on_proposal(block),
            Event::CommitReceived { block } => self.on_commit(block),
            Event::CommitTimeout { block } => self.on_commit_timeout(block),
        }
    }

    /// Handle an inbound proposed block: validate → append → sign → classify.
    pub fn on_proposal(&self, block: Block) -> Vec<Action> {
        let block_id = block.id();

        // The dispatcher already filters committed blocks; re-check here
        // because the commit can land while this block sat in the queue.
        if self.ledger.is_committed(&block_id) {
            trace!(?block_id, "Dropping proposal for committed block");
            return vec![];
        }

        if !self.validator.validate(&block) {
            info!(?block_id, height = block.height().0, "Stateful validation failed");
            return vec![];
        }

        let merkle_root = match self.ledger.append_tentative(&block) {
            Ok(root) => root,
            Err(e) => {
                error!(?block_id, error = %e, "Tentative append failed");
                return vec![];
            }
        };

        // Sign the tentative root. The signed block is a new value; the
        // count below includes our own signature.
        let signed = block.signed_by(self.roster.self_keypair(), merkle_root.as_bytes());

        if signatures::is_leader_originated(&signed, &self.roster) {
            debug!(?block_id, "Leader-originated block, broadcasting");
            return vec![
                Action::BroadcastProposal {
                    block: signed.clone(),
                },
                Action::SetCommitTimer {
                    block: signed,
                    duration: self.config.commit_timeout,
                },
            ];
        }

        let valid = signatures::count_valid(&signed, &self.roster);
        let quorum = self.roster.quorum();

        if valid < quorum {
            let Some(position) = self.relay.advance(block_id, &self.roster) else {
                error!(
                    ?block_id,
                    valid, quorum, "No tail position remains for relay"
                );
                return vec![];
            };
            debug!(?block_id, valid, quorum, position, "Relaying to next tail");
            return vec![
                Action::UnicastProposal {
                    block: signed.clone(),
                    position,
                },
                Action::SetCommitTimer {
                    block: signed,
                    duration: self.config.commit_timeout,
                },
            ];
        }

        if valid == quorum {
            info!(?block_id, valid, "Quorum reached, emitting commit");
            return vec![
                Action::BroadcastCommit {
                    block: signed.clone(),
                },
                Action::SetCommitTimer {
                    block: signed,
                    duration: self.config.commit_timeout,
                },
            ];
        }

        // Above quorum: an earlier chain position should already have
        // committed this block. The timer armed upstream owns recovery.
        debug!(?block_id, valid, quorum, "Signature count beyond quorum, ignoring");
        vec![]
    }

    /// Handle an inbound COMMIT frame: finalize and cancel the timer.
    pub fn on_commit(&self, block: Block) -> Vec<Action> {
        let block_id = block.id();

        if self.ledger.is_committed(&block_id) {
            trace!(?block_id, "Duplicate commit, ignoring");
            return vec![];
        }

        if let Err(e) = self.ledger.commit(&block) {
            // Keep the timer armed: the fallback path retries until the
            // ledger accepts the block or the chain exhausts.
            error!(?block_id, error = %e, "Ledger commit failed");
            return vec![];
        }

        self.relay.forget(&block_id);
        info!(
            ?block_id,
            height = block.height().0,
            signatures = block.signature_count(),
            "Block committed"
        );
        vec![Action::CancelCommitTimer { block_id }]
    }

    /// Handle a commit timer expiry: the BChain panic.
    ///
    /// Extends the validating set by one position and re-issues the
    /// unchanged block to the new tail. When every position through `N-1`
    /// has been asked, the block is denied locally; recovery belongs to
    /// peers earlier in the chain, whose own timers are still running.
    pub fn on_commit_timeout(&self, block: Block) -> Vec<Action> {
        let block_id = block.id();

        if self.ledger.is_committed(&block_id) {
            debug!(?block_id, "Commit landed while timer was in flight");
            return vec![];
        }

        let Some(position) = self.relay.advance(block_id, &self.roster) else {
            info!(?block_id, "Relay chain exhausted, denying block locally");
            self.relay.forget(&block_id);
            return vec![];
        };

        warn!(
            ?block_id,
            position, "Commit timer expired, extending chain to next tail"
        );
        vec![
            Action::UnicastProposal {
                block: block.clone(),
                position,
            },
            Action::SetCommitTimer {
                block,
                duration: self.config.commit_timeout,
            },
        ]
    }
}

impl std::fmt::Debug for SumeragiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SumeragiState")
            .field("self_position", &self.roster.self_position())
            .field("num_peers", &self.roster.len())
            .field("quorum", &self.roster.quorum())
            .field("blocks_in_relay", &self.relay.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use sumeragi_core::LedgerError;
    use sumeragi_types::{BlockBody, BlockHeight, Hash, KeyPair, Peer, Transaction};

    /// Validator that accepts everything.
    struct AcceptAll;

    impl StatefulValidator for AcceptAll {
        fn validate(&self, _block: &Block) -> bool {
            true
        }
    }

    /// Validator that rejects everything.
    struct RejectAll;

    impl StatefulValidator for RejectAll {
        fn validate(&self, _block: &Block) -> bool {
            false
        }
    }

    /// Minimal in-memory ledger: the tentative root is the body digest hex.
    #[derive(Default)]
    struct TestLedger {
        committed: Mutex<HashSet<Hash>>,
        fail_appends: bool,
    }

    impl Ledger for TestLedger {
        fn append_tentative(&self, block: &Block) -> Result<String, LedgerError> {
            if self.fail_appends {
                return Err(LedgerError::Unavailable("store offline".into()));
            }
            Ok(block.id().to_hex())
        }

        fn is_committed(&self, block_id: &Hash) -> bool {
            self.committed.lock().contains(block_id)
        }

        fn commit(&self, block: &Block) -> Result<(), LedgerError> {
            self.committed.lock().insert(block.id());
            Ok(())
        }
    }

    /// Keypairs sorted into chain order; index i is chain position i.
    fn ordered_keypairs(n: usize) -> Vec<KeyPair> {
        let mut kps: Vec<KeyPair> = (0..n)
            .map(|i| KeyPair::from_seed(&[i as u8 + 1; 32]))
            .collect();
        kps.sort_by(|a, b| a.public_key().as_bytes().cmp(b.public_key().as_bytes()));
        kps
    }

    /// State machine for peer at chain position `self_index` in a 4-peer
    /// roster (f=1, quorum=3), with an accept-all validator.
    fn state_at(kps: &[KeyPair], self_index: usize) -> SumeragiState {
        state_with(kps, self_index, Arc::new(AcceptAll), Arc::new(TestLedger::default()))
    }

    fn state_with(
        kps: &[KeyPair],
        self_index: usize,
        validator: Arc<dyn StatefulValidator>,
        ledger: Arc<dyn Ledger>,
    ) -> SumeragiState {
        let peers: Vec<Peer> = kps
            .iter()
            .enumerate()
            .map(|(i, kp)| Peer::new(kp.public_key(), format!("peer-{i}")))
            .collect();
        let roster = PeerRoster::from_ordered(peers, kps[self_index].clone()).unwrap();
        SumeragiState::new(roster, validator, ledger, SumeragiConfig::default())
    }

    fn test_block() -> Block {
        Block::new(BlockBody {
            height: BlockHeight(1),
            transactions: vec![Transaction(b"transfer".to_vec())],
        })
    }

    fn sign(block: &Block, kp: &KeyPair) -> Block {
        block.signed_by(kp, block.id().to_hex().as_bytes())
    }

    fn unicast_position(actions: &[Action]) -> Option<usize> {
        actions.iter().find_map(|a| match a {
            Action::UnicastProposal { position, .. } => Some(*position),
            _ => None,
        })
    }

    fn has_timer(actions: &[Action]) -> bool {
        actions
            .iter()
            .any(|a| matches!(a, Action::SetCommitTimer { .. }))
    }

    #[test]
    fn leader_relay_forwards_to_first_tail() {
        // Block carries the leader's signature; peer 1 signs and, still
        // short of quorum, unicasts to position 2 with a timer armed.
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block = sign(&test_block(), &kps[0]);

        let actions = state.on_proposal(block);

        assert_eq!(actions.len(), 2);
        assert_eq!(unicast_position(&actions), Some(2));
        assert!(has_timer(&actions));
        assert!(!actions
            .iter()
            .any(|a| matches!(a, Action::BroadcastProposal { .. } | Action::BroadcastCommit { .. })));
        match &actions[0] {
            Action::UnicastProposal { block, .. } => {
                assert_eq!(block.signature_count(), 2);
            }
            other => panic!("expected unicast, got {other:?}"),
        }
    }

    #[test]
    fn quorum_commit_broadcasts_commit() {
        // Two valid signatures arrive; the local signature makes quorum.
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block = sign(&sign(&test_block(), &kps[0]), &kps[2]);

        let actions = state.on_proposal(block);

        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], Action::BroadcastCommit { .. }));
        assert!(has_timer(&actions));
    }

    #[test]
    fn duplicate_signature_counts_once_toward_quorum() {
        // Chain [P0, P0, P2]: P0 counts once, plus P2 and self reach quorum.
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block = sign(&sign(&sign(&test_block(), &kps[0]), &kps[0]), &kps[2]);

        let actions = state.on_proposal(block);

        assert!(matches!(actions[0], Action::BroadcastCommit { .. }));
    }

    #[test]
    fn invalid_signature_is_not_counted() {
        // [P0 valid, P2 invalid]: two valid signatures after self-sign,
        // below quorum, so the block relays onward.
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let mut block = sign(&test_block(), &kps[0]);
        block.header.peer_signatures.push(sumeragi_types::PeerSignature {
            pubkey: kps[2].public_key(),
            signature: kps[2].sign(b"wrong payload"),
        });

        let actions = state.on_proposal(block);

        assert_eq!(unicast_position(&actions), Some(2));
        assert!(has_timer(&actions));
    }

    #[test]
    fn timeout_extends_chain_then_denies() {
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block = sign(&test_block(), &kps[0]);

        let actions = state.on_proposal(block.clone());
        assert_eq!(unicast_position(&actions), Some(2));

        // First timeout: ask position 3, re-arm.
        let signed = match &actions[0] {
            Action::UnicastProposal { block, .. } => block.clone(),
            other => panic!("expected unicast, got {other:?}"),
        };
        let actions = state.on_commit_timeout(signed.clone());
        assert_eq!(unicast_position(&actions), Some(3));
        assert!(has_timer(&actions));

        // Second timeout: every position through N-1 has been asked.
        let actions = state.on_commit_timeout(signed);
        assert!(actions.is_empty());
    }

    #[test]
    fn leader_origination_broadcasts() {
        // Self is position 0 and the block carries no outside signatures:
        // sign, broadcast, arm a timer, never consult the relay chain.
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 0);

        let actions = state.on_proposal(test_block());

        assert_eq!(actions.len(), 2);
        match &actions[0] {
            Action::BroadcastProposal { block } => {
                assert_eq!(block.signature_count(), 1);
            }
            other => panic!("expected broadcast, got {other:?}"),
        }
        assert!(has_timer(&actions));
        assert!(state.relay.is_empty());
    }

    #[test]
    fn validation_failure_drops_with_no_side_effects() {
        let kps = ordered_keypairs(4);
        let ledger = Arc::new(TestLedger::default());
        let state = state_with(&kps, 1, Arc::new(RejectAll), ledger);
        let block = sign(&test_block(), &kps[0]);

        let actions = state.on_proposal(block);

        assert!(actions.is_empty());
        assert!(state.relay.is_empty());
    }

    #[test]
    fn ledger_failure_drops_block() {
        let kps = ordered_keypairs(4);
        let ledger = Arc::new(TestLedger {
            fail_appends: true,
            ..Default::default()
        });
        let state = state_with(&kps, 1, Arc::new(AcceptAll), ledger);

        let actions = state.on_proposal(sign(&test_block(), &kps[0]));

        assert!(actions.is_empty());
    }

    #[test]
    fn beyond_quorum_is_a_no_op() {
        // Three valid signatures already present; self-sign makes four,
        // beyond strict quorum: an upstream peer already committed.
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block = sign(&sign(&sign(&test_block(), &kps[0]), &kps[2]), &kps[3]);

        let actions = state.on_proposal(block);

        assert!(actions.is_empty());
    }

    #[test]
    fn commit_finalizes_and_cancels_timer() {
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block = sign(&sign(&sign(&test_block(), &kps[0]), &kps[1]), &kps[2]);
        let block_id = block.id();

        let actions = state.on_commit(block.clone());

        assert!(state.is_committed(&block_id));
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            actions[0],
            Action::CancelCommitTimer { block_id: id } if id == block_id
        ));

        // Idempotent: a second commit is a no-op.
        assert!(state.on_commit(block).is_empty());
    }

    #[test]
    fn committed_proposal_is_dropped() {
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block = sign(&test_block(), &kps[0]);

        state.on_commit(block.clone());
        assert!(state.on_proposal(block).is_empty());
    }

    #[test]
    fn timeout_after_commit_is_a_no_op() {
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block = sign(&test_block(), &kps[0]);

        let actions = state.on_proposal(block.clone());
        assert_eq!(unicast_position(&actions), Some(2));

        state.on_commit(block.clone());
        assert!(state.on_commit_timeout(block).is_empty());
    }

    #[test]
    fn concurrent_blocks_keep_independent_tails() {
        let kps = ordered_keypairs(4);
        let state = state_at(&kps, 1);
        let block_a = sign(&test_block(), &kps[0]);
        let block_b = sign(
            &Block::new(BlockBody {
                height: BlockHeight(1),
                transactions: vec![Transaction(b"other proposal".to_vec())],
            }),
            &kps[0],
        );

        assert_eq!(unicast_position(&state.on_proposal(block_a.clone())), Some(2));
        // A's panic advances A's cursor only.
        assert_eq!(unicast_position(&state.on_commit_timeout(block_a)), Some(3));
        assert_eq!(unicast_position(&state.on_proposal(block_b)), Some(2));
    }
}
