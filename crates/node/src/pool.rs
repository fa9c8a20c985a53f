//! Bounded worker pool for block processing.
//!
//! Wraps a rayon pool with an explicit queue-depth bound. Submission never
//! blocks: when the bound is reached the task is rejected and the caller
//! drops the block, leaving recovery to the originator's commit timer.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors from the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Failed to build worker pool: {0}")]
    Build(String),

    #[error("Processing queue full ({capacity} tasks pending)")]
    QueueFull { capacity: usize },
}

/// A bounded block-processing pool.
///
/// `workers == 0` resolves to one worker per hardware thread. The queue
/// bound counts tasks submitted but not yet finished; rayon's own queue is
/// unbounded, so the bound is enforced with an atomic pending counter.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    pending: Arc<AtomicUsize>,
    capacity: usize,
}

impl WorkerPool {
    /// Create a pool with the given worker count and queue capacity.
    pub fn new(workers: usize, queue_size: usize) -> Result<Self, PoolError> {
        if queue_size == 0 {
            return Err(PoolError::Build("queue_size must be at least 1".into()));
        }
        let threads = if workers == 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4)
        } else {
            workers
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sumeragi-worker-{i}"))
            .build()
            .map_err(|e| PoolError::Build(e.to_string()))?;

        tracing::info!(threads, queue_size, "Worker pool initialized");

        Ok(Self {
            pool,
            pending: Arc::new(AtomicUsize::new(0)),
            capacity: queue_size,
        })
    }

    /// Submit a task, rejecting instead of blocking when the queue is full.
    pub fn try_submit<F>(&self, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let previous = self.pending.fetch_add(1, Ordering::SeqCst);
        if previous >= self.capacity {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(PoolError::QueueFull {
                capacity: self.capacity,
            });
        }

        let pending = self.pending.clone();
        self.pool.spawn(move || {
            f();
            pending.fetch_sub(1, Ordering::SeqCst);
        });
        Ok(())
    }

    /// Tasks submitted but not yet finished (for metrics).
    pub fn queue_depth(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.num_threads())
            .field("capacity", &self.capacity)
            .field("pending", &self.queue_depth())
            .finish()
    }
}
