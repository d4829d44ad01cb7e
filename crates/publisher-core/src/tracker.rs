//! In-flight publish accounting.
//!
//! Every message the publisher loop hands to a client gets an
//! [`InFlightHandle`]. The handle is registered (counter incremented) before
//! the client is called, and settles exactly once: resolved, failed, or
//! abandoned when it is dropped unsettled. The tracker is the only writer of
//! the counters; completion tasks on any thread go through the same atomic
//! path.
//!
//! ```text
//! track() ──▶ in_flight += 1 ──▶ client.publish() ──▶ ... ──▶ complete() ──▶ in_flight -= 1
//!                                                                  │
//!                                                                  └── failure: logged + failed += 1
//! ```

use action_types::{OrderingKey, WireMessage};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::client::MessageId;
use crate::error::PublishError;

/// What a failure log needs to be correlated with its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub sequence_num: u64,
    pub ordering_key: Option<OrderingKey>,
}

impl MessageContext {
    pub fn new(sequence_num: u64, ordering_key: Option<OrderingKey>) -> Self {
        Self {
            sequence_num,
            ordering_key,
        }
    }

    pub fn of(sequence_num: u64, message: &WireMessage) -> Self {
        Self::new(sequence_num, message.ordering_key.clone())
    }
}

/// Point-in-time view of the tracker counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerSnapshot {
    pub tracked: u64,
    pub in_flight: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    in_flight: AtomicU64,
    producers: AtomicU64,
    tracked: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    drained: Notify,
}

/// Owned, cloneable in-flight tracker for one publishing run.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    state: Arc<TrackerState>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one outstanding publish.
    ///
    /// Must be called before the message is handed to the client, so a
    /// completion can never be observed before its registration.
    pub fn track(&self, context: MessageContext) -> InFlightHandle {
        self.state.in_flight.fetch_add(1, Ordering::SeqCst);
        self.state.tracked.fetch_add(1, Ordering::Relaxed);
        InFlightHandle {
            inner: Arc::new(HandleInner {
                tracker: self.clone(),
                context,
                settled: AtomicBool::new(false),
            }),
        }
    }

    /// Keep the tracker from reporting drained while a producer is running.
    pub fn producer_guard(&self) -> ProducerGuard {
        self.state.producers.fetch_add(1, Ordering::SeqCst);
        ProducerGuard {
            tracker: self.clone(),
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.state.in_flight.load(Ordering::Acquire)
    }

    pub fn succeeded(&self) -> u64 {
        self.state.succeeded.load(Ordering::Acquire)
    }

    pub fn failed(&self) -> u64 {
        self.state.failed.load(Ordering::Acquire)
    }

    /// Racy snapshot of "nothing outstanding and no producer running".
    ///
    /// A polling primitive, not a barrier: the answer may be stale by the
    /// time the caller acts on it.
    pub fn is_drained(&self) -> bool {
        // `producers` and `in_flight` are written from different threads and
        // each writer then reads the other counter; all four operations are
        // SeqCst so the last writer always observes both at zero.
        self.state.producers.load(Ordering::SeqCst) == 0
            && self.state.in_flight.load(Ordering::SeqCst) == 0
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            tracked: self.state.tracked.load(Ordering::Acquire),
            in_flight: self.in_flight(),
            succeeded: self.succeeded(),
            failed: self.failed(),
        }
    }

    /// Future completing on the next transition to drained.
    ///
    /// Callers must `enable()` it before checking [`is_drained`](Self::is_drained)
    /// to avoid missing a wakeup.
    pub(crate) fn drained_signal(&self) -> Notified<'_> {
        self.state.drained.notified()
    }

    fn settle(&self, context: &MessageContext, result: Result<MessageId, PublishError>) {
        // Totals first, so they are final whenever the counter reads zero.
        match &result {
            Ok(message_id) => {
                self.state.succeeded.fetch_add(1, Ordering::AcqRel);
                debug!(
                    sequence_num = context.sequence_num,
                    message_id = %message_id,
                    "Message published"
                );
            }
            Err(PublishError::Abandoned) => {
                self.state.failed.fetch_add(1, Ordering::AcqRel);
                debug!(
                    sequence_num = context.sequence_num,
                    ordering_key = context.ordering_key.as_ref().map(|k| k.as_str()),
                    "Publish abandoned before completion"
                );
            }
            Err(err) => {
                self.state.failed.fetch_add(1, Ordering::AcqRel);
                warn!(
                    sequence_num = context.sequence_num,
                    ordering_key = context.ordering_key.as_ref().map(|k| k.as_str()),
                    kind = err.kind(),
                    "Could not publish a message: {err}"
                );
            }
        }

        let previous =
            self.state
                .in_flight
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match previous {
            Ok(1) => self.notify_if_drained(),
            Ok(_) => {}
            Err(_) => error!(
                sequence_num = context.sequence_num,
                "In-flight counter already at zero; ignoring extra settlement"
            ),
        }
    }

    fn notify_if_drained(&self) {
        if self.is_drained() {
            self.state.drained.notify_waiters();
        }
    }
}

#[derive(Debug)]
struct HandleInner {
    tracker: InFlightTracker,
    context: MessageContext,
    settled: AtomicBool,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        if !*self.settled.get_mut() {
            *self.settled.get_mut() = true;
            self.tracker
                .settle(&self.context, Err(PublishError::Abandoned));
        }
    }
}

/// One outstanding publish.
///
/// Clones refer to the same publish. The first [`complete`](Self::complete)
/// wins; later calls are ignored. Dropping the last clone unsettled settles
/// it as [`PublishError::Abandoned`].
#[derive(Debug, Clone)]
pub struct InFlightHandle {
    inner: Arc<HandleInner>,
}

impl InFlightHandle {
    pub fn context(&self) -> &MessageContext {
        &self.inner.context
    }

    pub fn is_settled(&self) -> bool {
        self.inner.settled.load(Ordering::Acquire)
    }

    /// Record the terminal outcome.
    ///
    /// Returns `false` if the handle was already settled, in which case the
    /// counters are left untouched.
    pub fn complete(&self, result: Result<MessageId, PublishError>) -> bool {
        if self.inner.settled.swap(true, Ordering::AcqRel) {
            debug!(
                sequence_num = self.inner.context.sequence_num,
                "Ignoring duplicate completion"
            );
            return false;
        }
        self.inner.tracker.settle(&self.inner.context, result);
        true
    }
}

/// Held by the publisher loop for as long as it may still dispatch.
#[derive(Debug)]
pub struct ProducerGuard {
    tracker: InFlightTracker,
}

impl Drop for ProducerGuard {
    fn drop(&mut self) {
        self.tracker
            .state
            .producers
            .fetch_sub(1, Ordering::SeqCst);
        self.tracker.notify_if_drained();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx(sequence_num: u64) -> MessageContext {
        MessageContext::new(sequence_num, OrderingKey::new("u1"))
    }

    #[test]
    fn test_track_and_complete() {
        let tracker = InFlightTracker::new();
        assert!(tracker.is_drained());

        let first = tracker.track(ctx(0));
        let second = tracker.track(ctx(1));
        assert_eq!(tracker.in_flight(), 2);
        assert!(!tracker.is_drained());

        assert!(first.complete(Ok(MessageId::new("0:0"))));
        assert!(second.complete(Err(PublishError::Delivery("boom".to_string()))));

        assert_eq!(
            tracker.snapshot(),
            TrackerSnapshot {
                tracked: 2,
                in_flight: 0,
                succeeded: 1,
                failed: 1,
            }
        );
        assert!(tracker.is_drained());
    }

    #[test]
    fn test_second_completion_is_ignored() {
        let tracker = InFlightTracker::new();
        let handle = tracker.track(ctx(0));
        let other = tracker.track(ctx(1));

        assert!(handle.complete(Ok(MessageId::new("a"))));
        assert!(!handle.complete(Ok(MessageId::new("a"))));
        assert!(!handle.clone().complete(Err(PublishError::Delivery("late".to_string()))));

        assert_eq!(tracker.in_flight(), 1);
        assert_eq!(tracker.succeeded(), 1);
        assert_eq!(tracker.failed(), 0);
        assert!(handle.is_settled());
        assert!(!other.is_settled());
    }

    #[test]
    fn test_dropped_handle_is_abandoned() {
        let tracker = InFlightTracker::new();
        let handle = tracker.track(ctx(0));
        let clone = handle.clone();

        drop(handle);
        assert_eq!(tracker.in_flight(), 1);

        drop(clone);
        assert_eq!(tracker.in_flight(), 0);
        assert_eq!(tracker.failed(), 1);
    }

    #[test]
    fn test_completed_handle_drop_does_not_settle_again() {
        let tracker = InFlightTracker::new();
        let handle = tracker.track(ctx(0));
        handle.complete(Ok(MessageId::new("a")));
        drop(handle);

        assert_eq!(tracker.snapshot().succeeded, 1);
        assert_eq!(tracker.snapshot().failed, 0);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_producer_guard_blocks_drained() {
        let tracker = InFlightTracker::new();
        let guard = tracker.producer_guard();
        assert_eq!(tracker.in_flight(), 0);
        assert!(!tracker.is_drained());

        drop(guard);
        assert!(tracker.is_drained());
    }

    #[test]
    fn test_concurrent_completions() {
        let tracker = InFlightTracker::new();
        let handles: Vec<_> = (0..1000).map(|i| tracker.track(ctx(i))).collect();

        let threads: Vec<_> = handles
            .chunks(100)
            .map(|chunk| {
                let chunk = chunk.to_vec();
                std::thread::spawn(move || {
                    for handle in chunk {
                        // Two racing completions per handle; only one may count.
                        let racer = handle.clone();
                        let t = std::thread::spawn(move || racer.complete(Ok(MessageId::new("r"))));
                        handle.complete(Ok(MessageId::new("m")));
                        t.join().unwrap();
                    }
                })
            })
            .collect();
        drop(handles);
        for t in threads {
            t.join().unwrap();
        }

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.succeeded, 1000);
        assert_eq!(snapshot.failed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_settlement_racing_producer_exit_wakes_waiter() {
        for round in 0..200u64 {
            let tracker = InFlightTracker::new();
            let guard = tracker.producer_guard();
            let handle = tracker.track(ctx(round));

            let waiter = {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    loop {
                        let notified = tracker.drained_signal();
                        tokio::pin!(notified);
                        notified.as_mut().enable();
                        if tracker.is_drained() {
                            return;
                        }
                        notified.await;
                    }
                })
            };

            let producer = std::thread::spawn(move || drop(guard));
            let completer = std::thread::spawn(move || handle.complete(Ok(MessageId::new("r"))));
            producer.join().unwrap();
            assert!(completer.join().unwrap());

            tokio::time::timeout(Duration::from_secs(5), waiter)
                .await
                .unwrap_or_else(|_| panic!("waiter missed the drained wakeup in round {round}"))
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_drained_signal_wakes_waiter() {
        let tracker = InFlightTracker::new();
        let handle = tracker.track(ctx(0));

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                loop {
                    let notified = tracker.drained_signal();
                    tokio::pin!(notified);
                    notified.as_mut().enable();
                    if tracker.is_drained() {
                        return;
                    }
                    notified.await;
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.complete(Ok(MessageId::new("x")));

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
