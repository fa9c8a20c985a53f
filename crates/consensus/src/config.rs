//! Consensus configuration.

use std::time::Duration;
use thiserror::Error;

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for the consensus core.
///
/// # Example
///
/// ```
/// use sumeragi_consensus::SumeragiConfig;
/// use std::time::Duration;
///
/// let config = SumeragiConfig::default()
///     .with_workers(4)
///     .with_commit_timeout(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SumeragiConfig {
    /// Worker threads for block processing.
    ///
    /// Default: 0 (one per hardware thread)
    pub workers: usize,

    /// Capacity of the block-processing queue. When full, inbound blocks are
    /// rejected rather than blocking the transport thread.
    ///
    /// Default: 1024
    pub queue_size: usize,

    /// How long a forwarded block may stay uncommitted before the fallback
    /// re-issue fires.
    ///
    /// Default: 3 seconds
    pub commit_timeout: Duration,
}

impl Default for SumeragiConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_size: 1024,
            commit_timeout: Duration::from_millis(3000),
        }
    }
}

impl SumeragiConfig {
    /// Set the worker thread count (0 = one per hardware thread).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the processing queue capacity.
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    /// Set the commit timeout.
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_size == 0 {
            return Err(ConfigError::Invalid(
                "queue_size must be at least 1".to_string(),
            ));
        }
        if self.commit_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "commit_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SumeragiConfig::default();
        assert_eq!(config.queue_size, 1024);
        assert_eq!(config.commit_timeout, Duration::from_millis(3000));
        assert_eq!(config.workers, 0);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_zero_queue() {
        let config = SumeragiConfig::default().with_queue_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = SumeragiConfig::default().with_commit_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
