//! One complete publishing run: publish, drain, close.

use action_types::Action;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::PublishClient;
use crate::config::PublisherConfig;
use crate::drain::{DrainController, DrainOutcome};
use crate::driver::{Publisher, RunStats};
use crate::error::{PublishError, Result};
use crate::pool::CompletionPool;
use crate::progress::ProgressSink;
use crate::tracker::InFlightTracker;

/// External requests to wind a session down.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignals {
    /// Stop pulling records; already dispatched messages still drain.
    pub stop_producing: CancellationToken,
    /// Stop waiting for outstanding publishes.
    pub abandon_drain: CancellationToken,
}

impl ShutdownSignals {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Final numbers of a session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub stats: RunStats,
    pub succeeded: u64,
    pub failed: u64,
    pub drain: DrainOutcome,
    pub close_error: Option<PublishError>,
}

impl SessionReport {
    /// A session succeeds when it drained, regardless of per-message
    /// failures.
    pub fn is_success(&self) -> bool {
        self.drain.is_drained()
    }
}

/// Publish every record of `source`, wait for the outstanding publishes and
/// close `client`.
///
/// The source is pulled on a blocking thread. The client is closed exactly
/// once, after the drain completed or was given up. Only a failure to set
/// the run up or a panicking producer is returned as an error.
pub async fn run_session<C, S, P>(
    client: Arc<C>,
    source: S,
    config: PublisherConfig,
    progress: P,
    signals: ShutdownSignals,
) -> Result<SessionReport>
where
    C: PublishClient,
    S: IntoIterator<Item = Action> + Send + 'static,
    P: ProgressSink + Send + 'static,
{
    let pool = CompletionPool::new()?;
    let tracker = InFlightTracker::new();
    let publisher = Publisher::new(
        Arc::clone(&client),
        &config,
        tracker.clone(),
        pool.spawner(),
    )
    .with_stop_signal(signals.stop_producing.clone());

    let produced = tokio::task::spawn_blocking(move || publisher.run(source, &progress)).await;

    let drain = DrainController::new(tracker.clone(), pool, config.drain)
        .drain(&signals.abandon_drain)
        .await;
    let close_error = close(client).await.err();

    let stats = produced?;
    let report = SessionReport {
        stats,
        succeeded: tracker.succeeded(),
        failed: tracker.failed(),
        drain,
        close_error,
    };
    info!(
        dispatched = report.stats.dispatched,
        succeeded = report.succeeded,
        failed = report.failed,
        drain = %report.drain,
        "Publishing session finished"
    );
    Ok(report)
}

async fn close<C: PublishClient>(client: Arc<C>) -> std::result::Result<(), PublishError> {
    let closed = tokio::task::spawn_blocking(move || client.close())
        .await
        .map_err(|e| PublishError::Close(e.to_string()))
        .and_then(|result| result);
    match &closed {
        Ok(()) => info!("Publish client closed"),
        Err(err) => warn!("Error while shutting down: {err}"),
    }
    closed
}
