//! Outbound consensus operations over a transport.

use super::codec::encode_message;
use std::sync::Arc;
use sumeragi_core::{CommitGossip, OutboundMessage, ProposalGossip};
use sumeragi_types::{Block, Peer, PeerRoster};
use thiserror::Error;
use tracing::warn;

/// Network errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Unknown peer endpoint: {0}")]
    UnknownPeer(String),
}

/// The wire seam: delivery of an encoded frame to one peer.
///
/// Fire-and-forget: a returned error means the frame was not handed to the
/// network, nothing more. Consensus relies on timers for recovery, never on
/// delivery acknowledgement. Implementations must be callable from pool
/// worker threads.
pub trait Transport: Send + Sync {
    /// Send a frame to a single peer.
    fn unicast(&self, peer: &Peer, frame: Vec<u8>) -> Result<(), TransportError>;
}

/// Outbound consensus operations: broadcast, unicast by chain position, and
/// commit dissemination.
///
/// Send and encode failures are logged and absorbed here; the state machine
/// never observes them.
pub struct ClientAdapter {
    transport: Arc<dyn Transport>,
    roster: PeerRoster,
}

impl ClientAdapter {
    /// Create an adapter over a transport for the given roster.
    pub fn new(transport: Arc<dyn Transport>, roster: PeerRoster) -> Self {
        Self { transport, roster }
    }

    /// Send a PROPOSE frame to every peer except this one.
    ///
    /// The local peer already processed the block when it signed it; looping
    /// the proposal back would re-enter the pipeline and sign it twice.
    pub fn broadcast_proposal(&self, block: Block) {
        let message = OutboundMessage::Proposal(ProposalGossip::new(block));
        let Some(frame) = self.encode(&message) else {
            return;
        };
        let self_position = self.roster.self_position();
        for (position, peer) in self.roster.iter().enumerate() {
            if position == self_position {
                continue;
            }
            self.send(peer, frame.clone());
        }
    }

    /// Send a PROPOSE frame to the peer at a chain position.
    pub fn unicast_proposal(&self, block: Block, position: usize) {
        let Some(peer) = self.roster.peer_at(position) else {
            warn!(position, "Unicast target beyond roster, dropping");
            return;
        };
        let message = OutboundMessage::Proposal(ProposalGossip::new(block));
        if let Some(frame) = self.encode(&message) {
            self.send(peer, frame);
        }
    }

    /// Send a COMMIT frame to every peer, this one included.
    ///
    /// The local peer transitions its own committed set by receiving the
    /// frame like everyone else, which also cancels its commit timer.
    pub fn broadcast_commit(&self, block: Block) {
        let message = OutboundMessage::Commit(CommitGossip::new(block));
        let Some(frame) = self.encode(&message) else {
            return;
        };
        for peer in self.roster.iter() {
            self.send(peer, frame.clone());
        }
    }

    fn encode(&self, message: &OutboundMessage) -> Option<Vec<u8>> {
        match encode_message(message) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!(message = message.type_name(), error = %e, "Frame encoding failed");
                None
            }
        }
    }

    fn send(&self, peer: &Peer, frame: Vec<u8>) {
        if let Err(e) = self.transport.unicast(peer, frame) {
            warn!(peer = %peer.address, error = %e, "Send failed, relying on timer");
        }
    }
}
