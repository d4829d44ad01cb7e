//! Operator-facing progress reporting.

use tracing::info;

/// Receives the running dispatch count at the configured cadence.
///
/// Purely observational; the publisher loop ignores what a sink does.
pub trait ProgressSink {
    fn report(&self, dispatched: u64);
}

impl<F> ProgressSink for F
where
    F: Fn(u64),
{
    fn report(&self, dispatched: u64) {
        self(dispatched)
    }
}

/// Logs "Published N messages." at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, dispatched: u64) {
        info!("Published {dispatched} messages.");
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _dispatched: u64) {}
}
