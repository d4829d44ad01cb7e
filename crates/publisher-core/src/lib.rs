//! Ordered asynchronous event publisher.
//!
//! Reads actions from a record source, encodes each one into a wire message
//! and hands it to a broker client without waiting for earlier deliveries.
//! Every outstanding publish is counted by an [`InFlightTracker`] so the run
//! can drain cleanly before the client is closed. Per-message failures are
//! logged and counted, never propagated.
//!
//! # Architecture
//!
//! ```text
//!  Record Source ──▶ Publisher::run ──▶ ActionCodec ──▶ PublishClient::publish
//!                          │                                   │
//!                          │ track()                           │ DeliveryFuture
//!                          ▼                                   ▼
//!                   InFlightTracker ◀──── complete() ──── CompletionPool
//!                          │
//!                          ▼
//!                   DrainController ──▶ release pool ──▶ PublishClient::close
//! ```
//!
//! # Ordering
//!
//! With ordering enabled each message carries its subject as ordering key,
//! and messages are handed to the client strictly in sequence-number order.
//! Per-key delivery order is then the client's responsibility.
//!
//! # Example
//!
//! ```rust,no_run
//! use publisher_core::testing::{actions_for, MockPublishClient};
//! use publisher_core::{run_session, LogProgress, PublisherConfig, ShutdownSignals};
//! use std::sync::Arc;
//!
//! # async fn example() -> publisher_core::Result<()> {
//! let client = Arc::new(MockPublishClient::new());
//! let config = PublisherConfig::new().with_ordering(true).with_message_limit(1000);
//! let report = run_session(
//!     client,
//!     actions_for(&["u1", "u2", "u1"]),
//!     config,
//!     LogProgress,
//!     ShutdownSignals::new(),
//! )
//! .await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod drain;
pub mod driver;
pub mod error;
pub mod pool;
pub mod progress;
pub mod session;
pub mod testing;
pub mod tracker;

pub use client::{DeliveryFuture, MessageId, PublishClient};
pub use config::{PublisherConfig, DEFAULT_PROGRESS_INTERVAL};
pub use drain::{DrainController, DrainOptions, DrainOutcome, DrainStrategy};
pub use driver::{Publisher, RunStats};
pub use error::{PublishError, PublisherError, Result};
pub use pool::{CompletionPool, CompletionSpawner};
pub use progress::{LogProgress, NoProgress, ProgressSink};
pub use session::{run_session, SessionReport, ShutdownSignals};
pub use tracker::{InFlightHandle, InFlightTracker, MessageContext, ProducerGuard, TrackerSnapshot};
