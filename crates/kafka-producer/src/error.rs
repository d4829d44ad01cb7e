//! Error types for the Kafka publish client.

use thiserror::Error;

/// Errors raised while setting up Kafka publishing.
///
/// Per-message failures are reported as `publisher_core::PublishError`.
#[derive(Error, Debug)]
pub enum KafkaProducerError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Topic creation error: {0}")]
    TopicCreation(String),
}

impl From<KafkaProducerError> for publisher_core::PublisherError {
    fn from(err: KafkaProducerError) -> Self {
        publisher_core::PublisherError::Construction(err.to_string())
    }
}
