use action_types::WireMessage;
use futures::channel::oneshot::Canceled;
use futures::FutureExt;
use publisher_core::{DeliveryFuture, MessageId, PublishClient, PublishError};
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::future_producer::OwnedDeliveryResult;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::KafkaProducerError;

/// Configuration for the Kafka publish client.
#[derive(Debug, Clone)]
pub struct KafkaProducerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Topic every message is published to
    pub topic: String,
    /// Key records by ordering key and enable idempotence
    pub ordering_enabled: bool,
    /// Delivery timeout per message, including retries
    pub message_timeout_ms: u64,
    /// Maximum number of messages queued locally before `publish` is
    /// rejected with a queue-full error
    pub queue_buffering_max_messages: u64,
    /// Time to wait for more messages before sending a batch
    pub linger_ms: u64,
    /// Upper bound for flushing queued messages on close
    pub close_timeout: Duration,
}

impl KafkaProducerConfig {
    pub fn new(brokers: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            topic: topic.into(),
            ordering_enabled: false,
            message_timeout_ms: 30_000,
            queue_buffering_max_messages: 100_000,
            linger_ms: 5,
            close_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_ordering(mut self, enabled: bool) -> Self {
        self.ordering_enabled = enabled;
        self
    }

    pub fn with_message_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.message_timeout_ms = timeout_ms;
        self
    }

    /// librdkafka settings for this configuration.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.brokers)
            .set("message.timeout.ms", self.message_timeout_ms.to_string())
            .set(
                "queue.buffering.max.messages",
                self.queue_buffering_max_messages.to_string(),
            )
            .set("linger.ms", self.linger_ms.to_string());
        if self.ordering_enabled {
            config
                .set("enable.idempotence", "true")
                .set("max.in.flight.requests.per.connection", "5");
        }
        config
    }

    fn validate(&self) -> Result<(), KafkaProducerError> {
        if self.brokers.trim().is_empty() {
            return Err(KafkaProducerError::InvalidConfig(
                "no Kafka brokers configured".to_string(),
            ));
        }
        if self.topic.trim().is_empty() {
            return Err(KafkaProducerError::InvalidConfig(
                "no topic configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Publishes wire messages to one Kafka topic.
pub struct KafkaPublishClient {
    producer: FutureProducer,
    topic: String,
    close_timeout: Duration,
}

impl KafkaPublishClient {
    /// Create the producer. Fails on an invalid configuration; does not wait
    /// for the brokers to be reachable.
    pub fn new(config: KafkaProducerConfig) -> Result<Self, KafkaProducerError> {
        config.validate()?;
        let producer: FutureProducer = config.client_config().create()?;
        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            ordering = config.ordering_enabled,
            "Kafka producer created"
        );
        Ok(Self {
            producer,
            topic: config.topic,
            close_timeout: config.close_timeout,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn record<'a>(&'a self, message: &'a WireMessage) -> FutureRecord<'a, [u8], [u8]> {
        let record = FutureRecord::to(&self.topic)
            .payload(message.payload.as_slice())
            .headers(record_headers(&message.attributes));
        match &message.ordering_key {
            Some(key) => record.key(key.as_bytes()),
            None => record,
        }
    }
}

impl PublishClient for KafkaPublishClient {
    fn publish(&self, message: WireMessage) -> Result<DeliveryFuture, PublishError> {
        match self.producer.send_result(self.record(&message)) {
            Ok(delivery) => Ok(async move { delivery_outcome(delivery.await) }.boxed()),
            Err((err, _record)) => Err(PublishError::Rejected(err.to_string())),
        }
    }

    fn close(&self) -> Result<(), PublishError> {
        debug!("Flushing Kafka producer (timeout {:?})", self.close_timeout);
        self.producer
            .flush(self.close_timeout)
            .map_err(|e| PublishError::Close(e.to_string()))
    }
}

fn delivery_outcome(
    delivery: Result<OwnedDeliveryResult, Canceled>,
) -> Result<MessageId, PublishError> {
    match delivery {
        Ok(Ok((partition, offset))) => Ok(MessageId::new(format!("{partition}:{offset}"))),
        Ok(Err((err, _message))) => Err(PublishError::Delivery(err.to_string())),
        Err(Canceled) => Err(PublishError::Delivery(
            "producer dropped the delivery".to_string(),
        )),
    }
}

/// Kafka headers carrying the wire attributes.
pub fn record_headers(attributes: &BTreeMap<String, String>) -> OwnedHeaders {
    attributes
        .iter()
        .fold(OwnedHeaders::new_with_capacity(attributes.len()), |headers, (key, value)| {
            headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_str()),
            })
        })
}
