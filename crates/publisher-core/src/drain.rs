//! Waiting for outstanding publishes before shutdown.
//!
//! The default strategy sleeps `poll_interval` between racy
//! [`InFlightTracker::is_drained`] checks, trading prompt wakeup for zero
//! coordination with the completion path. [`DrainStrategy::Notify`] instead
//! waits on the tracker's drained signal.
//!
//! Whatever the outcome, the controller releases the completion pool before
//! returning.

use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pool::CompletionPool;
use crate::tracker::InFlightTracker;

/// Default pause between two drained checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest pause the poll strategy sleeps between two checks.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainStrategy {
    /// Sleep and re-check.
    #[default]
    Poll,
    /// Wake up when the tracker signals it is drained.
    Notify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOptions {
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    pub strategy: DrainStrategy,
}

impl DrainOptions {
    /// The configured poll interval, raised to [`MIN_POLL_INTERVAL`].
    pub fn effective_poll_interval(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }
}

impl Default for DrainOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            strategy: DrainStrategy::Poll,
        }
    }
}

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing left in flight.
    Drained,
    /// The configured timeout elapsed first.
    TimedOut { in_flight: u64 },
    /// The caller asked to stop waiting.
    Interrupted { in_flight: u64 },
}

impl DrainOutcome {
    pub fn is_drained(&self) -> bool {
        matches!(self, DrainOutcome::Drained)
    }
}

impl fmt::Display for DrainOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainOutcome::Drained => write!(f, "drained"),
            DrainOutcome::TimedOut { in_flight } => {
                write!(f, "timed out with {in_flight} messages in flight")
            }
            DrainOutcome::Interrupted { in_flight } => {
                write!(f, "interrupted with {in_flight} messages in flight")
            }
        }
    }
}

/// Waits for a tracker to drain, then releases the completion pool.
pub struct DrainController {
    tracker: InFlightTracker,
    pool: CompletionPool,
    options: DrainOptions,
}

impl DrainController {
    pub fn new(tracker: InFlightTracker, pool: CompletionPool, options: DrainOptions) -> Self {
        Self {
            tracker,
            pool,
            options,
        }
    }

    /// Wait until drained, timed out or `abandon` is cancelled.
    ///
    /// On a non-drained outcome the remaining completions are cancelled and
    /// settle as abandoned.
    pub async fn drain(self, abandon: &CancellationToken) -> DrainOutcome {
        let DrainController {
            tracker,
            pool,
            options,
        } = self;

        info!(
            in_flight = tracker.in_flight(),
            strategy = ?options.strategy,
            "Waiting for outstanding publishes"
        );
        let deadline = options.timeout.map(|timeout| Instant::now() + timeout);
        let outcome = match options.strategy {
            DrainStrategy::Poll => {
                poll(&tracker, options.effective_poll_interval(), deadline, abandon).await
            }
            DrainStrategy::Notify => wait(&tracker, deadline, abandon).await,
        };

        match outcome {
            DrainOutcome::Drained => info!("All publishes completed"),
            other => warn!("Drain ended early: {other}"),
        }

        pool.release().await;
        outcome
    }
}

async fn poll(
    tracker: &InFlightTracker,
    poll_interval: Duration,
    deadline: Option<Instant>,
    abandon: &CancellationToken,
) -> DrainOutcome {
    loop {
        if tracker.is_drained() {
            return DrainOutcome::Drained;
        }
        let now = Instant::now();
        let nap = match deadline {
            Some(deadline) if now >= deadline => {
                return DrainOutcome::TimedOut {
                    in_flight: tracker.in_flight(),
                };
            }
            Some(deadline) => poll_interval.min(deadline - now),
            None => poll_interval,
        };
        debug!(in_flight = tracker.in_flight(), "Publishes still outstanding");

        tokio::select! {
            _ = sleep(nap) => {}
            _ = abandon.cancelled() => {
                return DrainOutcome::Interrupted {
                    in_flight: tracker.in_flight(),
                };
            }
        }
    }
}

async fn wait(
    tracker: &InFlightTracker,
    deadline: Option<Instant>,
    abandon: &CancellationToken,
) -> DrainOutcome {
    let expired = async {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(expired);

    loop {
        let drained = tracker.drained_signal();
        tokio::pin!(drained);
        drained.as_mut().enable();
        if tracker.is_drained() {
            return DrainOutcome::Drained;
        }

        tokio::select! {
            _ = &mut drained => {}
            _ = &mut expired => {
                if tracker.is_drained() {
                    return DrainOutcome::Drained;
                }
                return DrainOutcome::TimedOut {
                    in_flight: tracker.in_flight(),
                };
            }
            _ = abandon.cancelled() => {
                return DrainOutcome::Interrupted {
                    in_flight: tracker.in_flight(),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MessageId;
    use crate::tracker::MessageContext;
    use futures::FutureExt;

    fn options(strategy: DrainStrategy) -> DrainOptions {
        DrainOptions {
            poll_interval: Duration::from_millis(10),
            timeout: None,
            strategy,
        }
    }

    #[tokio::test]
    async fn test_empty_tracker_drains_immediately() {
        for strategy in [DrainStrategy::Poll, DrainStrategy::Notify] {
            let tracker = InFlightTracker::new();
            let pool = CompletionPool::new().unwrap();
            let outcome = DrainController::new(tracker, pool, options(strategy))
                .drain(&CancellationToken::new())
                .await;
            assert_eq!(outcome, DrainOutcome::Drained);
        }
    }

    #[tokio::test]
    async fn test_drains_after_late_completion() {
        for strategy in [DrainStrategy::Poll, DrainStrategy::Notify] {
            let tracker = InFlightTracker::new();
            let pool = CompletionPool::new().unwrap();
            let handle = tracker.track(MessageContext::new(0, None));

            tokio::spawn(async move {
                sleep(Duration::from_millis(30)).await;
                handle.complete(Ok(MessageId::new("0")));
            });

            let outcome = DrainController::new(tracker.clone(), pool, options(strategy))
                .drain(&CancellationToken::new())
                .await;
            assert_eq!(outcome, DrainOutcome::Drained);
            assert_eq!(tracker.succeeded(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        for strategy in [DrainStrategy::Poll, DrainStrategy::Notify] {
            let tracker = InFlightTracker::new();
            let pool = CompletionPool::new().unwrap();
            let _handle = tracker.track(MessageContext::new(0, None));

            let mut opts = options(strategy);
            opts.timeout = Some(Duration::from_secs(1));
            let outcome = DrainController::new(tracker, pool, opts)
                .drain(&CancellationToken::new())
                .await;
            assert_eq!(outcome, DrainOutcome::TimedOut { in_flight: 1 });
        }
    }

    #[tokio::test]
    async fn test_interrupt_releases_pool() {
        for strategy in [DrainStrategy::Poll, DrainStrategy::Notify] {
            let tracker = InFlightTracker::new();
            let pool = CompletionPool::new().unwrap();
            let handle = tracker.track(MessageContext::new(0, None));
            let never = futures::future::pending::<Result<MessageId, crate::PublishError>>();
            pool.spawner().spawn_completion(handle, never.boxed());

            let abandon = CancellationToken::new();
            let trigger = abandon.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(20)).await;
                trigger.cancel();
            });

            let outcome = DrainController::new(tracker.clone(), pool, options(strategy))
                .drain(&abandon)
                .await;
            assert_eq!(outcome, DrainOutcome::Interrupted { in_flight: 1 });

            // The released pool abandoned the pending completion.
            assert_eq!(tracker.in_flight(), 0);
            assert_eq!(tracker.failed(), 1);
        }
    }

    #[test]
    fn test_zero_poll_interval_is_raised() {
        assert_eq!(options(DrainStrategy::Poll).effective_poll_interval(), Duration::from_millis(10));

        let mut opts = options(DrainStrategy::Poll);
        opts.poll_interval = Duration::ZERO;
        assert_eq!(opts.effective_poll_interval(), MIN_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_still_sleeps() {
        let tracker = InFlightTracker::new();
        let pool = CompletionPool::new().unwrap();
        let _handle = tracker.track(MessageContext::new(0, None));

        let mut opts = options(DrainStrategy::Poll);
        opts.poll_interval = Duration::ZERO;
        opts.timeout = Some(Duration::from_millis(50));

        let started = Instant::now();
        let outcome = DrainController::new(tracker, pool, opts)
            .drain(&CancellationToken::new())
            .await;
        assert_eq!(outcome, DrainOutcome::TimedOut { in_flight: 1 });
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(DrainOutcome::Drained.to_string(), "drained");
        assert_eq!(
            DrainOutcome::TimedOut { in_flight: 3 }.to_string(),
            "timed out with 3 messages in flight"
        );
        assert!(!DrainOutcome::Interrupted { in_flight: 0 }.is_drained());
    }
}
