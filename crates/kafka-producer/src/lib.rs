//! Kafka publish client for action-publisher.
//!
//! Implements `publisher_core::PublishClient` on top of an rdkafka
//! `FutureProducer`:
//!
//! - wire attributes become record headers
//! - the ordering key becomes the record key, so every message of a key
//!   lands on one partition in submission order
//! - ordering mode enables producer idempotence so retries cannot reorder
//! - the message id is `partition:offset`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use action_publisher_kafka_producer::{ensure_topic, KafkaProducerConfig, KafkaPublishClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = KafkaProducerConfig::new("localhost:9092", "pubsub-e2e-example").with_ordering(true);
//!     ensure_topic(&config.brokers, &config.topic, 3).await?;
//!     let _client = KafkaPublishClient::new(config)?;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod topic;

pub use client::{record_headers, KafkaProducerConfig, KafkaPublishClient};
pub use error::KafkaProducerError;
pub use topic::ensure_topic;
