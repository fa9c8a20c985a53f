//! Per-block commit timers.
//!
//! Each forwarded block owns at most one timer, keyed by block identity.
//! Arming for an id that already has a timer replaces it; cancelling aborts
//! it. A fire sends [`Event::CommitTimeout`] into the runner's event channel,
//! transferring the block value from the timer back to the state machine.
//!
//! Pool workers reach the manager through a [`TimerHandle`] command channel,
//! so timer state never needs locking and workers never touch tokio state
//! directly.

use std::collections::HashMap;
use std::time::Duration;
use sumeragi_core::Event;
use sumeragi_types::{Block, Hash};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Commands sent to the timer task.
#[derive(Debug)]
pub enum TimerCommand {
    /// Arm (or replace) the commit timer for a block.
    Arm { block: Block, duration: Duration },

    /// Cancel the outstanding timer for a block, if any.
    Cancel { block_id: Hash },
}

/// Manages per-block commit timers.
///
/// Each timer is a tokio task that sleeps for the configured duration and
/// then sends a [`Event::CommitTimeout`] to the event channel.
pub struct TimerManager {
    /// Active timers (block id -> task handle).
    timers: HashMap<Hash, JoinHandle<()>>,
    /// Event sender for timer fires.
    event_tx: mpsc::Sender<Event>,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self {
            timers: HashMap::new(),
            event_tx,
        }
    }

    /// Spawn the command-processing task and return a cloneable handle.
    ///
    /// The task runs until every handle is dropped.
    pub fn spawn(event_tx: mpsc::Sender<Event>, command_capacity: usize) -> TimerHandle {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(command_capacity);
        let mut manager = TimerManager::new(event_tx);
        tokio::spawn(async move {
            while let Some(command) = cmd_rx.recv().await {
                match command {
                    TimerCommand::Arm { block, duration } => manager.arm(block, duration),
                    TimerCommand::Cancel { block_id } => manager.cancel(&block_id),
                }
            }
            manager.cancel_all();
        });
        TimerHandle { cmd_tx }
    }

    /// Arm a timer for `block`, replacing any outstanding one.
    pub fn arm(&mut self, block: Block, duration: Duration) {
        let block_id = block.id();

        // Cancel an existing timer with the same id and drop handles of
        // timers that already fired.
        self.cancel(&block_id);
        self.timers.retain(|_, handle| !handle.is_finished());

        let event_tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            trace!(?block_id, ?duration, "Commit timer armed, sleeping");
            tokio::time::sleep(duration).await;
            trace!(?block_id, "Commit timer fired");
            if event_tx
                .send(Event::CommitTimeout { block })
                .await
                .is_err()
            {
                debug!(?block_id, "Event channel closed, timeout dropped");
            }
        });

        self.timers.insert(block_id, handle);
        debug!(?block_id, ?duration, "Timer set");
    }

    /// Cancel a timer.
    ///
    /// If the timer doesn't exist or has already fired, this is a no-op.
    pub fn cancel(&mut self, block_id: &Hash) {
        if let Some(handle) = self.timers.remove(block_id) {
            handle.abort();
            debug!(?block_id, "Timer cancelled");
        }
    }

    /// Cancel all timers.
    ///
    /// Called during shutdown.
    pub fn cancel_all(&mut self) {
        for (block_id, handle) in self.timers.drain() {
            handle.abort();
            trace!(?block_id, "Timer cancelled (shutdown)");
        }
    }

    /// Number of timers that have not fired or been cancelled.
    pub fn active_count(&self) -> usize {
        self.timers
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Cloneable sender side of the timer command channel.
///
/// Used by pool workers, which run outside the async runtime; sends are
/// blocking and must not be called from async context.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cmd_tx: mpsc::Sender<TimerCommand>,
}

impl TimerHandle {
    /// Arm (or replace) the commit timer for a block.
    pub fn arm(&self, block: Block, duration: Duration) {
        if self
            .cmd_tx
            .blocking_send(TimerCommand::Arm { block, duration })
            .is_err()
        {
            warn!("Timer task gone, arm dropped");
        }
    }

    /// Cancel the outstanding timer for a block.
    pub fn cancel(&self, block_id: Hash) {
        if self
            .cmd_tx
            .blocking_send(TimerCommand::Cancel { block_id })
            .is_err()
        {
            warn!("Timer task gone, cancel dropped");
        }
    }
}
