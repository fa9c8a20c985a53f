//! Sumeragi consensus state machine.
//!
//! A chain-based Byzantine Fault Tolerant replication protocol in the BChain
//! family: blocks are relayed along a deterministic chain of peers instead of
//! being voted on all-to-all, and liveness under tail failure comes from
//! timeout-driven chain extension.
//!
//! # Architecture
//!
//! The state machine processes events synchronously:
//!
//! - `Event::ProposalReceived` → validate, tentatively append, sign, then
//!   broadcast (leader hop), relay to the next tail, or emit a commit
//! - `Event::CommitReceived` → finalize the block, cancel its timer
//! - `Event::CommitTimeout` → extend the validating set by one position and
//!   re-issue the block (the BChain *panic*)
//!
//! All I/O is performed by the runtime via returned `Action`s.
//!
//! # Terminology
//!
//! - **Chain position**: index of a peer in the globally agreed order.
//!   Position 0 is the leader; positions `0..=2f` form the nominal
//!   validating set A; positions `2f+1..N` are the fallback reservoir B.
//!
//! - **Proxy tail**: the last chain position that has been asked to sign a
//!   given block. Tracked per block, never globally.
//!
//! - **Quorum**: `2f + 1` distinct valid signatures commit a block, with
//!   `f = ⌊(N-1)/3⌋` derived from the live roster.
//!
//! # Safety and liveness
//!
//! - A signature only counts if it verifies against the block's body digest
//!   under a roster key, and each key counts at most once, so a commit
//!   certificate embeds `2f+1` distinct validators.
//! - A peer that forwards a block arms a commit timer; if the timer expires
//!   the peer asks one more position along the chain, up to `N-1`, after
//!   which it denies the block locally and leaves recovery to peers earlier
//!   in the chain.

mod config;
mod relay;
pub mod signatures;
mod state;

pub use config::{ConfigError, SumeragiConfig};
pub use relay::{RelayBook, RelayCursor};
pub use state::SumeragiState;
