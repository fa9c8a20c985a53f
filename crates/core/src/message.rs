//! Outbound message types for network communication.

use sbor::prelude::BasicSbor;
use sumeragi_types::Block;

/// Marker trait for types that cross the wire.
pub trait NetworkMessage {
    /// Stable identifier used in logs and frame dispatch.
    fn message_type_id() -> &'static str;
}

/// A block asking the receiver to validate, sign, and advance it.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct ProposalGossip {
    /// The block being relayed, with its signature chain so far.
    pub block: Block,
}

impl ProposalGossip {
    /// Wrap a block for proposal transport.
    pub fn new(block: Block) -> Self {
        ProposalGossip { block }
    }

    /// Consume and return the inner block.
    pub fn into_block(self) -> Block {
        self.block
    }
}

impl NetworkMessage for ProposalGossip {
    fn message_type_id() -> &'static str {
        "consensus.propose"
    }
}

/// A block that reached quorum; receivers mark it committed.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct CommitGossip {
    /// The committed block, quorum signatures included.
    pub block: Block,
}

impl CommitGossip {
    /// Wrap a block for commit dissemination.
    pub fn new(block: Block) -> Self {
        CommitGossip { block }
    }

    /// Consume and return the inner block.
    pub fn into_block(self) -> Block {
        self.block
    }
}

impl NetworkMessage for CommitGossip {
    fn message_type_id() -> &'static str {
        "consensus.commit"
    }
}

/// Outbound network messages.
///
/// These are the only frames the protocol puts on the wire. The runtime
/// handles the actual network I/O.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Block proposal relay (PROPOSE).
    Proposal(ProposalGossip),

    /// Commit dissemination (COMMIT).
    Commit(CommitGossip),
}

impl OutboundMessage {
    /// Get a human-readable name for this message type.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::Proposal(_) => "Proposal",
            OutboundMessage::Commit(_) => "Commit",
        }
    }
}
