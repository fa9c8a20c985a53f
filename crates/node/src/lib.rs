//! Runtime for the Sumeragi consensus core.
//!
//! The state machine in `sumeragi-consensus` is synchronous and I/O-free;
//! this crate supplies everything around it:
//!
//! - [`WorkerPool`]: bounded block-processing pool, rejection on overflow
//! - [`Dispatcher`]: committed-check + enqueue on the transport thread
//! - [`TimerManager`]/[`TimerHandle`]: per-block cancellable commit timers
//! - [`Transport`]/[`ClientAdapter`]: outbound unicast/broadcast/commit
//! - [`MemoryNetwork`]: in-process transport for multi-node tests
//! - [`MemoryLedger`]: reference in-memory block store
//! - [`SumeragiRunner`]: the event loop wiring it all together
//!
//! The transport callback path does only an O(1) committed check and an
//! enqueue; all cryptographic and validation work happens on pool workers.

mod dispatcher;
mod metrics;
pub mod network;
mod pool;
mod runner;
mod storage;
mod timers;

pub use dispatcher::{ActionSink, Dispatcher};
pub use metrics::{metrics, Metrics};
pub use network::{
    decode_message, encode_message, ClientAdapter, CodecError, MemoryNetwork, MemoryTransport,
    Transport, TransportError, WIRE_VERSION,
};
pub use pool::{PoolError, WorkerPool};
pub use runner::{RunnerError, ShutdownHandle, SumeragiRunner, SumeragiRunnerBuilder};
pub use storage::MemoryLedger;
pub use timers::{TimerCommand, TimerHandle, TimerManager};
