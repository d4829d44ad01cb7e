use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::info;

use crate::error::KafkaProducerError;

/// Create a Kafka topic if it doesn't exist.
///
/// An existing topic is not an error; its partition count is left as is.
pub async fn ensure_topic(
    brokers: &str,
    topic: &str,
    partitions: i32,
) -> Result<(), KafkaProducerError> {
    if partitions < 1 {
        return Err(KafkaProducerError::InvalidConfig(format!(
            "partition count must be positive, got {partitions}"
        )));
    }

    let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .create()?;

    let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(1));
    let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(10)));

    let results = admin_client
        .create_topics(&[new_topic], &opts)
        .await
        .map_err(|e| KafkaProducerError::TopicCreation(format!("Failed to create topic: {e}")))?;

    for result in results {
        match result {
            Ok(topic_name) => info!("Topic '{topic_name}' created successfully"),
            Err((topic_name, err)) => {
                let err_str = err.to_string();
                if err_str.contains("already exists") || err_str.contains("TopicExistsException")
                {
                    info!("Topic '{topic_name}' already exists");
                } else {
                    return Err(KafkaProducerError::TopicCreation(format!(
                        "Failed to create topic {topic_name}: {err}"
                    )));
                }
            }
        }
    }

    Ok(())
}
