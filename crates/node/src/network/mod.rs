//! Networking: wire codec, transport seam, and the in-process test network.

mod client;
mod codec;
mod memory;

pub use client::{ClientAdapter, Transport, TransportError};
pub use codec::{decode_message, encode_message, CodecError, WIRE_VERSION};
pub use memory::{MemoryNetwork, MemoryTransport};
