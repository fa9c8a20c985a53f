//! In-process network for multi-node tests.
//!
//! Every registered endpoint gets a bounded inbox; unicast pushes a frame
//! into the destination inbox unless the pair is partitioned. Partitions are
//! directional and drop frames silently, the way a dead link would; the
//! sender still observes success.

use super::client::{Transport, TransportError};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use sumeragi_types::Peer;
use tokio::sync::mpsc;
use tracing::trace;

#[derive(Default)]
struct Hub {
    inboxes: Mutex<HashMap<String, mpsc::Sender<Vec<u8>>>>,
    /// Directional partitions: frames from `.0` to `.1` are dropped.
    partitions: Mutex<HashSet<(String, String)>>,
}

/// A shared in-process network.
///
/// Clone-cheap handle; all clones see the same endpoints and partitions.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    hub: Arc<Hub>,
}

impl MemoryNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint; returns its transport and inbound frame stream.
    pub fn register(
        &self,
        address: impl Into<String>,
        inbox_capacity: usize,
    ) -> (MemoryTransport, mpsc::Receiver<Vec<u8>>) {
        let address = address.into();
        let (tx, rx) = mpsc::channel(inbox_capacity);
        self.hub.inboxes.lock().insert(address.clone(), tx);
        (
            MemoryTransport {
                hub: self.hub.clone(),
                local: address,
            },
            rx,
        )
    }

    /// Drop frames from `from` to `to` (one direction).
    pub fn partition(&self, from: &str, to: &str) {
        self.hub
            .partitions
            .lock()
            .insert((from.to_string(), to.to_string()));
    }

    /// Restore frames from `from` to `to`.
    pub fn heal(&self, from: &str, to: &str) {
        self.hub
            .partitions
            .lock()
            .remove(&(from.to_string(), to.to_string()));
    }

    /// Cut an endpoint off from every other endpoint, both directions.
    pub fn isolate(&self, address: &str) {
        let others: Vec<String> = self
            .hub
            .inboxes
            .lock()
            .keys()
            .filter(|a| a.as_str() != address)
            .cloned()
            .collect();
        let mut partitions = self.hub.partitions.lock();
        for other in others {
            partitions.insert((address.to_string(), other.clone()));
            partitions.insert((other, address.to_string()));
        }
    }

    /// Remove every partition.
    pub fn heal_all(&self) {
        self.hub.partitions.lock().clear();
    }
}

/// One endpoint's sending half of a [`MemoryNetwork`].
#[derive(Clone)]
pub struct MemoryTransport {
    hub: Arc<Hub>,
    local: String,
}

impl Transport for MemoryTransport {
    fn unicast(&self, peer: &Peer, frame: Vec<u8>) -> Result<(), TransportError> {
        if self
            .hub
            .partitions
            .lock()
            .contains(&(self.local.clone(), peer.address.clone()))
        {
            trace!(from = %self.local, to = %peer.address, "Frame dropped by partition");
            return Ok(());
        }

        let sender = {
            let inboxes = self.hub.inboxes.lock();
            inboxes
                .get(&peer.address)
                .cloned()
                .ok_or_else(|| TransportError::UnknownPeer(peer.address.clone()))?
        };
        sender
            .try_send(frame)
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}
