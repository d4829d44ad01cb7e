//! The publisher loop.
//!
//! Pulls actions from a source in order, assigns sequence numbers, encodes
//! and hands every message to the client without waiting for earlier
//! deliveries. Completions are settled on the completion pool.

use action_types::{Action, ActionCodec};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::PublishClient;
use crate::config::PublisherConfig;
use crate::pool::CompletionSpawner;
use crate::progress::ProgressSink;
use crate::tracker::{InFlightTracker, MessageContext};

/// Aggregate numbers of one publisher loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    /// Records pulled and handed to the dispatch path, including the ones
    /// the client refused.
    pub dispatched: u64,
    pub elapsed: Duration,
}

impl RunStats {
    pub fn messages_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.dispatched as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Dispatches actions to a [`PublishClient`].
pub struct Publisher<C: PublishClient> {
    client: Arc<C>,
    codec: ActionCodec,
    tracker: InFlightTracker,
    completions: CompletionSpawner,
    message_limit: Option<u64>,
    progress_interval: u64,
    stop: CancellationToken,
}

impl<C: PublishClient> Publisher<C> {
    pub fn new(
        client: Arc<C>,
        config: &PublisherConfig,
        tracker: InFlightTracker,
        completions: CompletionSpawner,
    ) -> Self {
        Self {
            client,
            codec: ActionCodec::new(config.ordering_enabled)
                .with_extra_info_bytes(config.extra_info_bytes),
            tracker,
            completions,
            message_limit: config.message_limit,
            progress_interval: config.progress_interval,
            stop: CancellationToken::new(),
        }
    }

    /// Stop pulling records once `stop` is cancelled.
    ///
    /// Messages already dispatched are unaffected.
    pub fn with_stop_signal(mut self, stop: CancellationToken) -> Self {
        self.stop = stop;
        self
    }

    pub fn tracker(&self) -> &InFlightTracker {
        &self.tracker
    }

    /// Publish records until the source is exhausted, the message limit is
    /// reached or a stop is requested.
    ///
    /// Never waits on a delivery and never fails: per-message errors are
    /// settled through the tracker. Blocks only inside `source`.
    pub fn run<S, P>(&self, source: S, progress: &P) -> RunStats
    where
        S: IntoIterator<Item = Action>,
        P: ProgressSink + ?Sized,
    {
        let started = Instant::now();
        let _producing = self.tracker.producer_guard();
        let mut records = source.into_iter();
        let mut dispatched: u64 = 0;

        info!(
            ordering = self.codec.ordering_enabled(),
            message_limit = ?self.message_limit,
            "Publishing actions"
        );

        loop {
            if self.message_limit.is_some_and(|limit| dispatched >= limit) {
                debug!("Message limit of {dispatched} reached");
                break;
            }
            if self.stop.is_cancelled() {
                info!("Stop requested after {dispatched} messages");
                break;
            }
            let Some(action) = records.next() else {
                debug!("Source exhausted after {dispatched} messages");
                break;
            };

            self.dispatch(dispatched, &action);
            dispatched += 1;

            if self.progress_interval > 0 && dispatched % self.progress_interval == 0 {
                progress.report(dispatched);
            }
        }

        let stats = RunStats {
            dispatched,
            elapsed: started.elapsed(),
        };
        info!(
            "Dispatched {} messages in {:?} ({:.2} msg/sec)",
            stats.dispatched,
            stats.elapsed,
            stats.messages_per_second()
        );
        stats
    }

    fn dispatch(&self, sequence_num: u64, action: &Action) {
        let message = self.codec.encode(action, sequence_num);
        // Registered before the client sees the message.
        let handle = self
            .tracker
            .track(MessageContext::of(sequence_num, &message));
        match self.client.publish(message) {
            Ok(delivery) => self.completions.spawn_completion(handle, delivery),
            Err(err) => {
                handle.complete(Err(err));
            }
        }
    }
}
