//! Chain position selection and fallback growth.
//!
//! Each in-flight block owns a [`RelayCursor`] tracking how far along the
//! relay chain it has been pushed. Cursor state is keyed by block identity in
//! a [`RelayBook`]: one block's timeouts never disturb another block's
//! fallback sequence, and concurrent proposals at the same height stay
//! independent.

use parking_lot::Mutex;
use std::collections::HashMap;
use sumeragi_types::{Hash, PeerRoster};

/// Relay progress for one block.
///
/// A fresh cursor points at position `2f`, the last member of the nominal
/// validating set A. Each [`RelayCursor::advance`] yields the current
/// position and moves one step toward the end of the chain; once every
/// position through `N-1` has been asked, the chain is exhausted and
/// `advance` yields `None` forever.
#[derive(Debug, Clone)]
pub struct RelayCursor {
    next: usize,
    start: usize,
    num_peers: usize,
}

impl RelayCursor {
    /// Cursor for a fresh block context under `roster`.
    pub fn new(roster: &PeerRoster) -> Self {
        let start = 2 * roster.max_faulty();
        RelayCursor {
            next: start,
            start,
            num_peers: roster.len(),
        }
    }

    /// Yield the next chain position to ask, or `None` when exhausted.
    pub fn advance(&mut self) -> Option<usize> {
        if self.next >= self.num_peers {
            return None;
        }
        let position = self.next;
        self.next += 1;
        Some(position)
    }

    /// The proxy tail: the last position already asked, if any.
    pub fn last_asked(&self) -> Option<usize> {
        if self.next > self.start {
            Some(self.next - 1)
        } else {
            None
        }
    }
}

/// Registry of per-block relay cursors.
#[derive(Debug, Default)]
pub struct RelayBook {
    cursors: Mutex<HashMap<Hash, RelayCursor>>,
}

impl RelayBook {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor for `block_id`, creating a fresh one on first use.
    pub fn advance(&self, block_id: Hash, roster: &PeerRoster) -> Option<usize> {
        self.cursors
            .lock()
            .entry(block_id)
            .or_insert_with(|| RelayCursor::new(roster))
            .advance()
    }

    /// Drop the cursor for a block that committed or was denied.
    pub fn forget(&self, block_id: &Hash) {
        self.cursors.lock().remove(block_id);
    }

    /// Number of blocks with live relay state.
    pub fn len(&self) -> usize {
        self.cursors.lock().len()
    }

    /// Whether no block has live relay state.
    pub fn is_empty(&self) -> bool {
        self.cursors.lock().is_empty()
    }
}
