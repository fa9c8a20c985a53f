//! Event types for the consensus state machine.

use sumeragi_types::Block;

/// All possible inputs to the state machine.
///
/// Events are **passive data** - they describe something that happened.
/// The state machine processes events and returns actions.
#[derive(Debug, Clone)]
pub enum Event {
    /// A PROPOSE frame arrived: a block carrying one or more signatures,
    /// asking this peer to validate, sign, and advance it along the chain.
    ProposalReceived { block: Block },

    /// A COMMIT frame arrived: the block reached quorum somewhere along the
    /// chain and every peer should mark it committed. No signatures are
    /// added while handling this.
    CommitReceived { block: Block },

    /// The commit timer for a forwarded block expired without the block
    /// being committed. The timer owned this block value from arming until
    /// the fire; handling it triggers the fallback re-issue.
    CommitTimeout { block: Block },
}

impl Event {
    /// Get the event type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::ProposalReceived { .. } => "ProposalReceived",
            Event::CommitReceived { .. } => "CommitReceived",
            Event::CommitTimeout { .. } => "CommitTimeout",
        }
    }

    /// Check if this event came from the network (vs. a local timer).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Event::ProposalReceived { .. } | Event::CommitReceived { .. }
        )
    }

    /// The identity of the block this event concerns.
    pub fn block_id(&self) -> sumeragi_types::Hash {
        match self {
            Event::ProposalReceived { block }
            | Event::CommitReceived { block }
            | Event::CommitTimeout { block } => block.id(),
        }
    }
}
