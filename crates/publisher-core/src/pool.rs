//! Executor for completion callbacks.
//!
//! Each accepted publish gets one task that awaits its delivery future and
//! settles the matching [`InFlightHandle`]. The pool owns those tasks for the
//! duration of a run and is released by the drain controller, whatever the
//! drain outcome.

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::client::DeliveryFuture;
use crate::error::{PublisherError, Result};
use crate::tracker::InFlightHandle;

/// Owner of the completion tasks of one run.
#[derive(Debug)]
pub struct CompletionPool {
    spawner: CompletionSpawner,
}

impl CompletionPool {
    /// Bind a pool to the tokio runtime the caller is running on.
    pub fn new() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            PublisherError::Construction(format!("completion pool needs a tokio runtime: {e}"))
        })?;
        Ok(Self::with_runtime(runtime))
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            spawner: CompletionSpawner {
                runtime,
                tasks: TaskTracker::new(),
                shutdown: CancellationToken::new(),
            },
        }
    }

    /// Cheap handle for spawning completions, usable from any thread.
    pub fn spawner(&self) -> CompletionSpawner {
        self.spawner.clone()
    }

    /// Number of completion tasks still running.
    pub fn pending(&self) -> usize {
        self.spawner.tasks.len()
    }

    /// Stop accepting completions, cancel the ones still waiting and wait for
    /// every task to finish.
    ///
    /// Cancelled tasks drop their handles, which settles them as abandoned.
    pub async fn release(self) {
        let pending = self.pending();
        if pending > 0 {
            debug!("Cancelling {pending} pending completion tasks");
        }
        self.spawner.shutdown.cancel();
        self.spawner.tasks.close();
        self.spawner.tasks.wait().await;
    }
}

impl Drop for CompletionPool {
    fn drop(&mut self) {
        self.spawner.shutdown.cancel();
        self.spawner.tasks.close();
    }
}

/// Spawns completion tasks into a [`CompletionPool`].
#[derive(Debug, Clone)]
pub struct CompletionSpawner {
    runtime: Handle,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl CompletionSpawner {
    /// Settle `handle` with the outcome of `delivery` once it resolves.
    ///
    /// After the pool was released the handle is dropped right away and
    /// settles as abandoned.
    pub fn spawn_completion(&self, handle: InFlightHandle, delivery: DeliveryFuture) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let shutdown = self.shutdown.clone();
        self.tasks.spawn_on(
            async move {
                tokio::select! {
                    biased;
                    result = delivery => {
                        handle.complete(result);
                    }
                    _ = shutdown.cancelled() => {}
                }
            },
            &self.runtime,
        );
    }
}
