//! Node runner: wires transport, timers, dispatcher, and state machine.

use crate::dispatcher::{ActionSink, Dispatcher};
use crate::metrics::metrics;
use crate::network::{decode_message, ClientAdapter, Transport};
use crate::pool::WorkerPool;
use crate::storage::MemoryLedger;
use crate::timers::TimerManager;
use std::sync::Arc;
use sumeragi_consensus::{SumeragiConfig, SumeragiState};
use sumeragi_core::{Event, Ledger, StatefulValidator};
use sumeragi_types::PeerRoster;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Errors from runner construction and execution.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Missing builder field: {0}")]
    MissingField(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(#[from] sumeragi_consensus::ConfigError),

    #[error("Worker pool: {0}")]
    Pool(#[from] crate::pool::PoolError),
}

/// Handle for shutting down a running [`SumeragiRunner`].
///
/// When dropped, signals the runner to exit gracefully.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl ShutdownHandle {
    /// Trigger shutdown (consumes the handle).
    pub fn shutdown(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ShutdownHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Builder for constructing a [`SumeragiRunner`].
///
/// Required fields:
/// - `roster` - the agreed peer order and this node's identity
/// - `validator` - stateful block validation
/// - `transport` - outbound frame delivery
/// - `inbound` - the stream of raw frames from the wire
///
/// Optional fields:
/// - `ledger` - block store (defaults to an in-memory ledger)
/// - `config` - consensus tunables (defaults to [`SumeragiConfig::default`])
/// - `channel_capacity` - event/timer channel capacity (defaults to 1024)
pub struct SumeragiRunnerBuilder {
    roster: Option<PeerRoster>,
    validator: Option<Arc<dyn StatefulValidator>>,
    ledger: Option<Arc<dyn Ledger>>,
    transport: Option<Arc<dyn Transport>>,
    inbound: Option<mpsc::Receiver<Vec<u8>>>,
    config: SumeragiConfig,
    channel_capacity: usize,
}

impl SumeragiRunnerBuilder {
    fn new() -> Self {
        Self {
            roster: None,
            validator: None,
            ledger: None,
            transport: None,
            inbound: None,
            config: SumeragiConfig::default(),
            channel_capacity: 1024,
        }
    }

    /// Set the peer roster.
    pub fn roster(mut self, roster: PeerRoster) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Set the stateful validator.
    pub fn validator(mut self, validator: Arc<dyn StatefulValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Set the ledger (defaults to [`MemoryLedger`]).
    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Set the transport and its inbound frame stream.
    pub fn transport(
        mut self,
        transport: Arc<dyn Transport>,
        inbound: mpsc::Receiver<Vec<u8>>,
    ) -> Self {
        self.transport = Some(transport);
        self.inbound = Some(inbound);
        self
    }

    /// Set the consensus configuration.
    pub fn config(mut self, config: SumeragiConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the internal channel capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Build the runner.
    ///
    /// Must be called within a tokio runtime: the timer task is spawned
    /// here so pool workers can arm timers before `run` is polled.
    pub fn build(self) -> Result<(SumeragiRunner, ShutdownHandle), RunnerError> {
        let roster = self.roster.ok_or(RunnerError::MissingField("roster"))?;
        let validator = self
            .validator
            .ok_or(RunnerError::MissingField("validator"))?;
        let transport = self
            .transport
            .ok_or(RunnerError::MissingField("transport"))?;
        let inbound = self.inbound.ok_or(RunnerError::MissingField("inbound"))?;
        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(MemoryLedger::new()) as Arc<dyn Ledger>);
        self.config.validate()?;

        let pool = WorkerPool::new(self.config.workers, self.config.queue_size)?;
        let (event_tx, event_rx) = mpsc::channel(self.channel_capacity);
        let timers = TimerManager::spawn(event_tx, self.channel_capacity);
        let client = Arc::new(ClientAdapter::new(transport, roster.clone()));
        let state = Arc::new(SumeragiState::new(roster, validator, ledger, self.config));
        let dispatcher = Dispatcher::new(state, pool, ActionSink::new(client, timers));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        Ok((
            SumeragiRunner {
                dispatcher,
                event_rx,
                inbound,
                shutdown_rx,
            },
            ShutdownHandle {
                tx: Some(shutdown_tx),
            },
        ))
    }
}

/// The node event loop.
///
/// Receives raw frames from the transport and timeout events from the timer
/// task, decodes, and feeds the dispatcher. Decoding and the committed check
/// are the only work done on this thread; everything else runs on the pool.
pub struct SumeragiRunner {
    dispatcher: Dispatcher,
    event_rx: mpsc::Receiver<Event>,
    inbound: mpsc::Receiver<Vec<u8>>,
    shutdown_rx: oneshot::Receiver<()>,
}

impl SumeragiRunner {
    /// Create a builder.
    pub fn builder() -> SumeragiRunnerBuilder {
        SumeragiRunnerBuilder::new()
    }

    /// Run the event loop until shutdown or transport close.
    pub async fn run(mut self) -> Result<(), RunnerError> {
        let roster = self.dispatcher.state().roster();
        info!(
            self_pubkey = %roster.self_pubkey(),
            position = roster.self_position(),
            num_peers = roster.len(),
            quorum = roster.quorum(),
            "Starting sumeragi runner"
        );

        loop {
            tokio::select! {
                biased;

                // Shutdown first.
                _ = &mut self.shutdown_rx => {
                    info!("Shutdown signal received");
                    break;
                }

                // Timer events next: timeouts drive liveness and must not
                // starve behind a network flood.
                Some(event) = self.event_rx.recv() => {
                    self.observe(&event);
                    self.dispatcher.dispatch(event);
                }

                // Network frames.
                frame = self.inbound.recv() => {
                    match frame {
                        Some(bytes) => match decode_message(&bytes) {
                            Ok(event) => {
                                self.observe(&event);
                                self.dispatcher.dispatch(event);
                            }
                            Err(e) => {
                                warn!(error = %e, "Dropping undecodable frame");
                                metrics().undecodable_frames.inc();
                            }
                        },
                        None => {
                            info!("Transport closed, stopping");
                            break;
                        }
                    }
                }
            }
        }

        info!("Runner stopped");
        Ok(())
    }

    fn observe(&self, event: &Event) {
        if let Event::CommitReceived { block } = event {
            // Count first observations only; repeats are dispatcher drops.
            if !self.dispatcher.state().is_committed(&block.id()) {
                metrics().blocks_committed.inc();
                metrics().committed_height.set(block.height().0 as f64);
            }
        }
    }
}

impl std::fmt::Debug for SumeragiRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SumeragiRunner")
            .field("state", self.dispatcher.state())
            .finish_non_exhaustive()
    }
}
