//! Error types for the publisher core.

use thiserror::Error;

/// Failure of a single message.
///
/// Never escapes the publisher loop: the tracker logs it and counts it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The client refused the message synchronously.
    #[error("Publish rejected: {0}")]
    Rejected(String),

    /// The broker reported a failure through the delivery future.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The completion was dropped before the broker answered, because
    /// draining was abandoned.
    #[error("Publish abandoned before completion")]
    Abandoned,

    /// The client could not release its broker connection.
    #[error("Close failed: {0}")]
    Close(String),
}

impl PublishError {
    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::Rejected(_) => "dispatch",
            PublishError::Delivery(_) => "delivery",
            PublishError::Abandoned => "abandoned",
            PublishError::Close(_) => "close",
        }
    }
}

/// Errors that abort a publishing run.
#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("Publisher construction failed: {0}")]
    Construction(String),

    #[error("Producer task failed: {0}")]
    Producer(#[from] tokio::task::JoinError),
}

/// Result type alias for publisher operations.
pub type Result<T> = std::result::Result<T, PublisherError>;
