//! Publisher configuration.

use std::time::Duration;

use crate::drain::{DrainOptions, DrainStrategy};

/// Default cadence of progress reports, in dispatched records.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Configuration for one publishing run.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Attach the record's subject as ordering key.
    pub ordering_enabled: bool,

    /// Stop after this many dispatched records. `None` runs until the
    /// source is exhausted.
    pub message_limit: Option<u64>,

    /// Report progress every this many dispatched records. Zero disables
    /// progress reports.
    pub progress_interval: u64,

    /// Size of the zero padding attached to every payload. Zero disables it.
    pub extra_info_bytes: usize,

    pub drain: DrainOptions,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            ordering_enabled: false,
            message_limit: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            extra_info_bytes: 0,
            drain: DrainOptions::default(),
        }
    }
}

impl PublisherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ordering(mut self, enabled: bool) -> Self {
        self.ordering_enabled = enabled;
        self
    }

    pub fn with_message_limit(mut self, limit: u64) -> Self {
        self.message_limit = Some(limit);
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_extra_info_bytes(mut self, bytes: usize) -> Self {
        self.extra_info_bytes = bytes;
        self
    }

    pub fn with_drain_poll_interval(mut self, interval: Duration) -> Self {
        self.drain.poll_interval = interval;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain.timeout = Some(timeout);
        self
    }

    pub fn with_drain_strategy(mut self, strategy: DrainStrategy) -> Self {
        self.drain.strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PublisherConfig::default();
        assert!(!config.ordering_enabled);
        assert_eq!(config.message_limit, None);
        assert_eq!(config.progress_interval, 100_000);
        assert_eq!(config.extra_info_bytes, 0);
        assert_eq!(config.drain.poll_interval, Duration::from_secs(5));
        assert_eq!(config.drain.timeout, None);
        assert_eq!(config.drain.strategy, DrainStrategy::Poll);
    }

    #[test]
    fn test_builders() {
        let config = PublisherConfig::new()
            .with_ordering(true)
            .with_message_limit(10)
            .with_progress_interval(2)
            .with_extra_info_bytes(1024)
            .with_drain_poll_interval(Duration::from_millis(50))
            .with_drain_timeout(Duration::from_secs(1))
            .with_drain_strategy(DrainStrategy::Notify);

        assert!(config.ordering_enabled);
        assert_eq!(config.message_limit, Some(10));
        assert_eq!(config.progress_interval, 2);
        assert_eq!(config.extra_info_bytes, 1024);
        assert_eq!(config.drain.poll_interval, Duration::from_millis(50));
        assert_eq!(config.drain.timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.drain.strategy, DrainStrategy::Notify);
    }
}
