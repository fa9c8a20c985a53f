//! Node metrics using the native Prometheus client.
//!
//! Metrics are domain-specific rather than generic event counters. Use
//! traces for event-level granularity during investigations.

use prometheus::{register_counter, register_gauge, Counter, Gauge};
use std::sync::OnceLock;

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Domain-specific metrics for node monitoring.
pub struct Metrics {
    // === Consensus ===
    /// Proposals accepted into the processing pipeline.
    pub blocks_processed: Counter,
    /// Blocks that reached the local committed set.
    pub blocks_committed: Counter,
    /// Commit timers that fired and triggered the fallback path.
    pub commit_timeouts: Counter,
    /// Height of the latest committed block.
    pub committed_height: Gauge,

    // === Dispatch ===
    /// Inbound blocks dropped because they were already committed.
    pub committed_drops: Counter,
    /// Tasks rejected because the processing queue was full.
    pub pool_rejections: Counter,
    /// Current processing queue depth.
    pub pool_queue_depth: Gauge,

    // === Network ===
    /// Frames that failed to decode.
    pub undecodable_frames: Counter,
}

impl Metrics {
    fn new() -> Self {
        Self {
            blocks_processed: register_counter!(
                "sumeragi_blocks_processed_total",
                "Proposals accepted into the processing pipeline"
            )
            .expect("metric registration"),
            blocks_committed: register_counter!(
                "sumeragi_blocks_committed_total",
                "Blocks that reached the local committed set"
            )
            .expect("metric registration"),
            commit_timeouts: register_counter!(
                "sumeragi_commit_timeouts_total",
                "Commit timers fired"
            )
            .expect("metric registration"),
            committed_height: register_gauge!(
                "sumeragi_committed_height",
                "Height of the latest committed block"
            )
            .expect("metric registration"),
            committed_drops: register_counter!(
                "sumeragi_committed_drops_total",
                "Inbound blocks dropped as already committed"
            )
            .expect("metric registration"),
            pool_rejections: register_counter!(
                "sumeragi_pool_rejections_total",
                "Tasks rejected by the bounded processing queue"
            )
            .expect("metric registration"),
            pool_queue_depth: register_gauge!(
                "sumeragi_pool_queue_depth",
                "Current processing queue depth"
            )
            .expect("metric registration"),
            undecodable_frames: register_counter!(
                "sumeragi_undecodable_frames_total",
                "Inbound frames that failed to decode"
            )
            .expect("metric registration"),
        }
    }
}

/// Global metrics handle; registered once on first use.
pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}
