//! Message encoding and decoding for network transport.
//!
//! # Wire Format
//!
//! ```text
//! [version: u8][kind: u8][payload: SBOR-encoded gossip struct]
//! ```
//!
//! - Version is currently `1`
//! - Kind `0` is a proposal (PROPOSE), kind `1` a commit (COMMIT)
//!
//! The kind byte dispatches the payload type; there is no field-level type
//! tag inside the payload. Body bytes travel opaque end to end.

use sumeragi_core::{CommitGossip, Event, NetworkMessage, OutboundMessage, ProposalGossip};
use thiserror::Error;
use tracing::trace;

/// Current wire format version.
pub const WIRE_VERSION: u8 = 1;

/// Frame kind tag for proposals.
const KIND_PROPOSAL: u8 = 0;
/// Frame kind tag for commits.
const KIND_COMMIT: u8 = 1;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unknown wire version: {0}")]
    UnknownVersion(u8),

    #[error("Unknown frame kind: {0}")]
    UnknownKind(u8),

    #[error("Message too short")]
    MessageTooShort,

    #[error("SBOR decode error: {0}")]
    Decode(String),

    #[error("SBOR encode error: {0}")]
    Encode(String),
}

/// Encode an outbound message to wire format.
pub fn encode_message(message: &OutboundMessage) -> Result<Vec<u8>, CodecError> {
    let (kind, payload) = match message {
        OutboundMessage::Proposal(gossip) => (
            KIND_PROPOSAL,
            sbor::basic_encode(gossip).map_err(|e| CodecError::Encode(format!("{e:?}")))?,
        ),
        OutboundMessage::Commit(gossip) => (
            KIND_COMMIT,
            sbor::basic_encode(gossip).map_err(|e| CodecError::Encode(format!("{e:?}")))?,
        ),
    };

    let mut bytes = Vec::with_capacity(2 + payload.len());
    bytes.push(WIRE_VERSION);
    bytes.push(kind);
    bytes.extend(payload);
    Ok(bytes)
}

/// Decode a message from wire format into the event it triggers.
pub fn decode_message(data: &[u8]) -> Result<Event, CodecError> {
    if data.len() < 2 {
        return Err(CodecError::MessageTooShort);
    }

    let version = data[0];
    if version != WIRE_VERSION {
        return Err(CodecError::UnknownVersion(version));
    }

    let kind = data[1];
    let payload = &data[2..];

    match kind {
        KIND_PROPOSAL => {
            let gossip: ProposalGossip =
                sbor::basic_decode(payload).map_err(|e| CodecError::Decode(format!("{e:?}")))?;
            trace!(message = ProposalGossip::message_type_id(), "Frame decoded");
            Ok(Event::ProposalReceived {
                block: gossip.into_block(),
            })
        }
        KIND_COMMIT => {
            let gossip: CommitGossip =
                sbor::basic_decode(payload).map_err(|e| CodecError::Decode(format!("{e:?}")))?;
            trace!(message = CommitGossip::message_type_id(), "Frame decoded");
            Ok(Event::CommitReceived {
                block: gossip.into_block(),
            })
        }
        other => Err(CodecError::UnknownKind(other)),
    }
}
