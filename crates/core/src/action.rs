//! Action types for the consensus state machine.

use std::time::Duration;
use sumeragi_types::{Block, Hash};

/// Actions the state machine wants to perform.
///
/// Actions are **commands** - they describe something to do. The runtime
/// executes actions; it never interprets consensus rules itself.
///
/// Network actions are fire-and-forget: send failures are logged by the
/// runtime and recovery is owned by the commit timers, never by synchronous
/// delivery acknowledgement.
#[derive(Debug, Clone)]
pub enum Action {
    /// Send a PROPOSE frame to every peer in parallel.
    ///
    /// Emitted for leader-originated blocks (first hop in the chain).
    BroadcastProposal { block: Block },

    /// Send a PROPOSE frame to the peer at one chain position.
    ///
    /// Emitted when the block still needs signatures and the relay chain has
    /// a next tail to ask.
    UnicastProposal { block: Block, position: usize },

    /// Send a COMMIT frame to every peer.
    ///
    /// Emitted when the post-signing signature count reaches quorum.
    BroadcastCommit { block: Block },

    /// Arm (or replace) the commit timer for a block.
    ///
    /// Every outbound PROPOSE or COMMIT arms exactly one timer; the timer
    /// either fires a [`crate::Event::CommitTimeout`] once or is cancelled
    /// once.
    SetCommitTimer { block: Block, duration: Duration },

    /// Cancel the outstanding commit timer for a block, if any.
    CancelCommitTimer { block_id: Hash },
}

impl Action {
    /// Check if this action sends a network frame.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Action::BroadcastProposal { .. }
                | Action::UnicastProposal { .. }
                | Action::BroadcastCommit { .. }
        )
    }

    /// Check if this action touches the timer registry.
    pub fn is_timer(&self) -> bool {
        matches!(
            self,
            Action::SetCommitTimer { .. } | Action::CancelCommitTimer { .. }
        )
    }

    /// Get the action type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::BroadcastProposal { .. } => "BroadcastProposal",
            Action::UnicastProposal { .. } => "UnicastProposal",
            Action::BroadcastCommit { .. } => "BroadcastCommit",
            Action::SetCommitTimer { .. } => "SetCommitTimer",
            Action::CancelCommitTimer { .. } => "CancelCommitTimer",
        }
    }
}
