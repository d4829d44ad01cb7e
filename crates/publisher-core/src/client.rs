//! Boundary to the external broker.

use action_types::WireMessage;
use futures::future::BoxFuture;
use std::fmt;

use crate::error::PublishError;

/// Identifier the broker assigned to a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves exactly once with the broker's verdict for one message.
pub type DeliveryFuture = BoxFuture<'static, Result<MessageId, PublishError>>;

/// A client able to hand messages to a broker topic.
///
/// Implementations:
/// - `KafkaPublishClient` in the `action-publisher-kafka-producer` crate
/// - [`MockPublishClient`](crate::testing::MockPublishClient) for tests
///
/// When a message carries an ordering key, the client must preserve
/// submission order among all messages sharing that key.
pub trait PublishClient: Send + Sync + 'static {
    /// Accept a message for delivery.
    ///
    /// Must not wait for delivery. An `Err` means the message was refused
    /// before it reached the broker.
    fn publish(&self, message: WireMessage) -> Result<DeliveryFuture, PublishError>;

    /// Release broker-side resources.
    ///
    /// Called once, after every delivery future has resolved or draining was
    /// abandoned. May block.
    fn close(&self) -> Result<(), PublishError>;
}
