//! Command-line arguments and their translation into library configuration.

use action_publisher_csv_source::CsvSourceConfig;
use action_publisher_kafka_producer::KafkaProducerConfig;
use clap::{Args, ValueEnum};
use publisher_core::{DrainStrategy, PublisherConfig, DEFAULT_PROGRESS_INTERVAL};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{duration_arg, positive_duration_arg};

/// Topic used when `--topic` is not given.
pub const DEFAULT_TOPIC: &str = "pubsub-e2e-example";

/// Kafka connection arguments shared by every subcommand.
#[derive(Args, Clone, Debug)]
pub struct KafkaArgs {
    /// Kafka brokers (comma-separated list)
    #[arg(long, env = "KAFKA_BROKERS", default_value = "localhost:9092")]
    pub brokers: String,

    /// Topic to publish to
    #[arg(long, default_value = DEFAULT_TOPIC)]
    pub topic: String,
}

/// Arguments of `action-publisher publish`.
#[derive(Args, Clone, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub kafka: KafkaArgs,

    /// CSV file of actions (columns: user_id,action,item_id,price,timestamp)
    #[arg(long, value_name = "PATH")]
    pub source: PathBuf,

    /// Replay the CSV file from the top when it is exhausted
    #[arg(long)]
    pub repeat: bool,

    /// CSV delimiter character
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// Key every message by its user so a user's actions stay in order
    #[arg(long)]
    pub ordered: bool,

    /// Stop after dispatching this many messages
    #[arg(long, value_name = "N")]
    pub message_limit: Option<u64>,

    /// Log progress every N dispatched messages
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,

    /// Pad every payload with this many bytes of base64 filler
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    pub extra_info_bytes: usize,

    /// Pause between two in-flight checks while draining (e.g. 500ms, 5s)
    #[arg(long, default_value = "5s", value_parser = positive_duration_arg)]
    pub drain_poll_interval: Duration,

    /// Give up draining after this long (default: wait forever)
    #[arg(long, value_parser = duration_arg)]
    pub drain_timeout: Option<Duration>,

    /// How the drain waits for outstanding publishes
    #[arg(long, value_enum, default_value_t = DrainStrategyArg::Poll)]
    pub drain_strategy: DrainStrategyArg,

    /// Per-message delivery timeout in milliseconds, including retries
    #[arg(long, default_value_t = 30_000)]
    pub message_timeout_ms: u64,
}

impl PublishArgs {
    pub fn publisher_config(&self) -> PublisherConfig {
        let mut config = PublisherConfig::new()
            .with_ordering(self.ordered)
            .with_progress_interval(self.progress_interval)
            .with_extra_info_bytes(self.extra_info_bytes)
            .with_drain_poll_interval(self.drain_poll_interval)
            .with_drain_strategy(self.drain_strategy.into());
        if let Some(limit) = self.message_limit {
            config = config.with_message_limit(limit);
        }
        if let Some(timeout) = self.drain_timeout {
            config = config.with_drain_timeout(timeout);
        }
        config
    }

    pub fn producer_config(&self) -> KafkaProducerConfig {
        KafkaProducerConfig::new(&self.kafka.brokers, &self.kafka.topic)
            .with_ordering(self.ordered)
            .with_message_timeout_ms(self.message_timeout_ms)
    }

    pub fn source_config(&self) -> anyhow::Result<CsvSourceConfig> {
        if !self.delimiter.is_ascii() {
            anyhow::bail!("Delimiter must be an ASCII character, got {:?}", self.delimiter);
        }
        Ok(CsvSourceConfig {
            delimiter: self.delimiter as u8,
            repeat: self.repeat,
        })
    }
}

/// Arguments of `action-publisher create-topic`.
#[derive(Args, Clone, Debug)]
pub struct CreateTopicArgs {
    #[command(flatten)]
    pub kafka: KafkaArgs,

    /// Number of partitions for a new topic
    #[arg(long, default_value_t = 1)]
    pub partitions: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DrainStrategyArg {
    /// Check the in-flight count at every poll interval
    #[value(name = "poll")]
    Poll,
    /// Wake up as soon as the last publish settles
    #[value(name = "notify")]
    Notify,
}

impl From<DrainStrategyArg> for DrainStrategy {
    fn from(arg: DrainStrategyArg) -> Self {
        match arg {
            DrainStrategyArg::Poll => DrainStrategy::Poll,
            DrainStrategyArg::Notify => DrainStrategy::Notify,
        }
    }
}
