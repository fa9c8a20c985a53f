//! Reference in-memory ledger.
//!
//! Real deployments put a durable block store behind the [`Ledger`] trait;
//! this one backs tests and local runs. The persistence format itself is out
//! of scope for the consensus core.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use sumeragi_core::{Ledger, LedgerError};
use sumeragi_types::{Block, Hash};

#[derive(Default)]
struct Inner {
    committed_ids: HashSet<Hash>,
    blocks_by_height: BTreeMap<u64, Block>,
}

/// In-memory block store.
///
/// Writes are serialized behind a single lock (the single-writer discipline
/// the consensus layer expects from a ledger); `is_committed` is a cheap
/// read-side lookup safe to call from the transport thread.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of the highest committed block, if any.
    pub fn committed_height(&self) -> Option<u64> {
        self.inner
            .read()
            .blocks_by_height
            .keys()
            .next_back()
            .copied()
    }

    /// Number of committed blocks.
    pub fn len(&self) -> usize {
        self.inner.read().committed_ids.len()
    }

    /// Whether nothing has committed yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().committed_ids.is_empty()
    }

    /// A committed block by height, if present.
    pub fn block_at(&self, height: u64) -> Option<Block> {
        self.inner.read().blocks_by_height.get(&height).cloned()
    }
}

impl Ledger for MemoryLedger {
    fn append_tentative(&self, block: &Block) -> Result<String, LedgerError> {
        // Degenerate single-leaf merkle root: the body digest itself. This
        // keeps locally produced signatures checkable from the block value
        // alone, which the pure signature counter requires.
        Ok(block.id().to_hex())
    }

    fn is_committed(&self, block_id: &Hash) -> bool {
        self.inner.read().committed_ids.contains(block_id)
    }

    fn commit(&self, block: &Block) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        if !inner.committed_ids.insert(block.id()) {
            return Ok(());
        }
        inner.blocks_by_height.insert(block.height().0, block.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sumeragi_types::{BlockBody, BlockHeight, Transaction};

    fn block(height: u64, tag: u8) -> Block {
        Block::new(BlockBody {
            height: BlockHeight(height),
            transactions: vec![Transaction(vec![tag])],
        })
    }

    #[test]
    fn tentative_root_is_body_digest_hex() {
        let ledger = MemoryLedger::new();
        let b = block(1, 1);
        assert_eq!(ledger.append_tentative(&b).unwrap(), b.id().to_hex());
    }

    #[test]
    fn commit_is_idempotent() {
        let ledger = MemoryLedger::new();
        let b = block(1, 1);
        assert!(!ledger.is_committed(&b.id()));

        ledger.commit(&b).unwrap();
        ledger.commit(&b).unwrap();

        assert!(ledger.is_committed(&b.id()));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.committed_height(), Some(1));
    }

    #[test]
    fn tracks_height_index() {
        let ledger = MemoryLedger::new();
        ledger.commit(&block(1, 1)).unwrap();
        ledger.commit(&block(2, 2)).unwrap();

        assert_eq!(ledger.committed_height(), Some(2));
        assert_eq!(ledger.block_at(1).unwrap().height(), BlockHeight(1));
        assert!(ledger.block_at(3).is_none());
    }
}
