//! Action Publisher
//!
//! Publishes a stream of user actions to Kafka. Dispatch never waits for a
//! delivery; every publish is tracked until the broker answers, and the run
//! ends with a bounded drain before the producer is closed.
//!
//! # Crates
//!
//! - `action_types` - the action record, wire message and codec
//! - `publisher_core` - the publisher loop, in-flight tracking, drain and session
//! - `action_publisher_kafka_producer` - the Kafka publish client
//! - `action_publisher_csv_source` - CSV files as a record source
//!
//! # CLI Usage
//!
//! ```bash
//! # Create the topic with one partition per expected consumer
//! action-publisher create-topic --brokers localhost:9092 --partitions 4
//!
//! # Publish a CSV file in per-user order, replaying it up to 1M messages
//! action-publisher publish --source actions.csv --ordered --repeat \
//!   --message-limit 1000000 --drain-timeout 10m
//! ```

pub mod args;
pub mod config;
mod summary;

pub use action_publisher_csv_source as csv;
pub use action_publisher_kafka_producer as kafka;
pub use action_types as types;

pub use args::{CreateTopicArgs, DrainStrategyArg, KafkaArgs, PublishArgs, DEFAULT_TOPIC};
pub use summary::format_summary;
