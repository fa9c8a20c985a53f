//! Inbound event dispatch onto the worker pool.

use crate::metrics::metrics;
use crate::network::ClientAdapter;
use crate::pool::{PoolError, WorkerPool};
use crate::timers::TimerHandle;
use std::sync::Arc;
use sumeragi_consensus::SumeragiState;
use sumeragi_core::{Action, Event};
use tracing::{trace, warn};

/// Executes the actions a state-machine handler returns.
///
/// Runs on pool worker threads: network sends go straight out through the
/// adapter, timer operations go through the command channel.
#[derive(Clone)]
pub struct ActionSink {
    client: Arc<ClientAdapter>,
    timers: TimerHandle,
}

impl ActionSink {
    /// Create a sink over an adapter and a timer handle.
    pub fn new(client: Arc<ClientAdapter>, timers: TimerHandle) -> Self {
        Self { client, timers }
    }

    /// Execute one action.
    pub fn execute(&self, action: Action) {
        trace!(action = action.type_name(), "Executing action");
        match action {
            Action::BroadcastProposal { block } => self.client.broadcast_proposal(block),
            Action::UnicastProposal { block, position } => {
                self.client.unicast_proposal(block, position)
            }
            Action::BroadcastCommit { block } => self.client.broadcast_commit(block),
            Action::SetCommitTimer { block, duration } => self.timers.arm(block, duration),
            Action::CancelCommitTimer { block_id } => self.timers.cancel(block_id),
        }
    }
}

/// Receives inbound events and hands them to pool workers.
///
/// The dispatching thread does only an O(1) committed check and an enqueue;
/// validation, hashing, and signing all happen on the pool. When the queue
/// is full the event is dropped with a warning — the transport thread must
/// never block, and the originator recovers through its own commit timer.
pub struct Dispatcher {
    state: Arc<SumeragiState>,
    pool: WorkerPool,
    sink: ActionSink,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(state: Arc<SumeragiState>, pool: WorkerPool, sink: ActionSink) -> Self {
        Self { state, pool, sink }
    }

    /// The shared state machine.
    pub fn state(&self) -> &Arc<SumeragiState> {
        &self.state
    }

    /// Route one event to a pool worker.
    pub fn dispatch(&self, event: Event) {
        // Fast path for network frames: a block that already committed is
        // dropped before it costs a worker slot.
        if event.is_network() {
            let block_id = event.block_id();
            if self.state.is_committed(&block_id) {
                trace!(?block_id, "Already committed, dropping");
                metrics().committed_drops.inc();
                return;
            }
        }

        match &event {
            Event::ProposalReceived { .. } => metrics().blocks_processed.inc(),
            Event::CommitTimeout { .. } => metrics().commit_timeouts.inc(),
            Event::CommitReceived { .. } => {}
        }

        let state = Arc::clone(&self.state);
        let sink = self.sink.clone();
        let submitted = self.pool.try_submit(move || {
            for action in state.handle(event) {
                sink.execute(action);
            }
        });

        match submitted {
            Ok(()) => {
                metrics().pool_queue_depth.set(self.pool.queue_depth() as f64);
            }
            Err(PoolError::QueueFull { capacity }) => {
                warn!(capacity, "Processing queue full, dropping event");
                metrics().pool_rejections.inc();
            }
            Err(e) => warn!(error = %e, "Failed to submit processing task"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{MemoryNetwork, Transport};
    use crate::storage::MemoryLedger;
    use crate::timers::TimerManager;
    use sumeragi_consensus::SumeragiConfig;
    use sumeragi_core::{Ledger, StatefulValidator};
    use sumeragi_types::{
        Block, BlockBody, BlockHeight, KeyPair, Peer, PeerRoster, Transaction,
    };
    use tokio::sync::mpsc;

    struct AcceptAll;

    impl StatefulValidator for AcceptAll {
        fn validate(&self, _block: &Block) -> bool {
            true
        }
    }

    fn ordered_keypairs(n: usize) -> Vec<KeyPair> {
        let mut kps: Vec<KeyPair> = (0..n)
            .map(|i| KeyPair::from_seed(&[i as u8 + 1; 32]))
            .collect();
        kps.sort_by(|a, b| a.public_key().as_bytes().cmp(b.public_key().as_bytes()));
        kps
    }

    fn test_block() -> Block {
        Block::new(BlockBody {
            height: BlockHeight(1),
            transactions: vec![Transaction(b"tx".to_vec())],
        })
    }

    /// Dispatcher for position 1 of a 4-peer roster wired to a memory
    /// network; returns the inbox of position 2 for observing relays.
    fn dispatcher_fixture() -> (Dispatcher, Arc<MemoryLedger>, mpsc::Receiver<Vec<u8>>, Vec<KeyPair>)
    {
        let kps = ordered_keypairs(4);
        let peers: Vec<Peer> = kps
            .iter()
            .enumerate()
            .map(|(i, kp)| Peer::new(kp.public_key(), format!("peer-{i}")))
            .collect();
        let roster = PeerRoster::from_ordered(peers, kps[1].clone()).unwrap();

        let network = MemoryNetwork::new();
        let (transport, _self_rx) = network.register("peer-1", 64);
        for i in [0usize, 3] {
            let _ = network.register(format!("peer-{i}"), 64);
        }
        let (_t2, rx2) = network.register("peer-2", 64);

        let ledger = Arc::new(MemoryLedger::new());
        let state = Arc::new(SumeragiState::new(
            roster.clone(),
            Arc::new(AcceptAll),
            ledger.clone() as Arc<dyn Ledger>,
            SumeragiConfig::default(),
        ));

        let (event_tx, _event_rx) = mpsc::channel(64);
        let timers = TimerManager::spawn(event_tx, 64);
        let client = Arc::new(ClientAdapter::new(
            Arc::new(transport) as Arc<dyn Transport>,
            roster,
        ));
        let pool = WorkerPool::new(2, 64).unwrap();
        let dispatcher = Dispatcher::new(state, pool, ActionSink::new(client, timers));
        (dispatcher, ledger, rx2, kps)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn proposal_flows_through_to_the_next_tail() {
        let (dispatcher, _ledger, mut rx2, kps) = dispatcher_fixture();
        let block = test_block();
        let block = block.signed_by(&kps[0], block.id().to_hex().as_bytes());

        dispatcher.dispatch(Event::ProposalReceived { block });

        // The worker signs and unicasts to chain position 2.
        let frame = tokio::time::timeout(std::time::Duration::from_secs(2), rx2.recv())
            .await
            .expect("relay frame")
            .expect("channel open");
        match crate::network::decode_message(&frame).unwrap() {
            Event::ProposalReceived { block } => assert_eq!(block.signature_count(), 2),
            other => panic!("expected proposal, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn committed_blocks_are_dropped_on_the_dispatch_thread() {
        let (dispatcher, ledger, mut rx2, kps) = dispatcher_fixture();
        let block = test_block();
        let block = block.signed_by(&kps[0], block.id().to_hex().as_bytes());
        ledger.commit(&block).unwrap();

        dispatcher.dispatch(Event::ProposalReceived { block });

        // Nothing reaches the pool, so nothing is relayed.
        let result = tokio::time::timeout(std::time::Duration::from_millis(200), rx2.recv()).await;
        assert!(result.is_err());
    }
}
