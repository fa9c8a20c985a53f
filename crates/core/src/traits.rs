//! Collaborator interfaces.
//!
//! Consensus delegates everything stateful to these seams: transaction-level
//! validation and the block store. Implementations must be safe to call from
//! multiple pool workers concurrently.

use sumeragi_types::{Block, Hash};
use thiserror::Error;

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Block {0} conflicts with committed state")]
    Conflict(Hash),
}

/// Stateful validation of a proposed block.
///
/// Expected to be idempotent and side-effect free; a rejected block is
/// dropped with no local state change.
pub trait StatefulValidator: Send + Sync {
    /// Check the block against current world state.
    fn validate(&self, block: &Block) -> bool;
}

/// The block store consensus appends to and commits into.
pub trait Ledger: Send + Sync {
    /// Tentatively append the block and return the merkle root (hex) over
    /// chain-plus-this-block.
    ///
    /// The returned root is the payload the local peer signs, binding the
    /// signature to ledger position. The root of the head block must agree
    /// with the block's canonical body digest so that signatures remain
    /// checkable from the block value alone.
    fn append_tentative(&self, block: &Block) -> Result<String, LedgerError>;

    /// Whether a block identity has already been committed.
    ///
    /// Must be O(1): the dispatcher calls this on the transport thread.
    fn is_committed(&self, block_id: &Hash) -> bool;

    /// Finalize a committed block.
    ///
    /// Must be idempotent; the commit frame can arrive more than once.
    fn commit(&self, block: &Block) -> Result<(), LedgerError>;
}
