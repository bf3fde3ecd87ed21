use anyhow::{Context, Result};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::Message;
use thiserror::Error;
use tracing::info;

use crate::config::KafkaConfig;
use crate::kafka::types::OrderPlacedEvent;

/// Why a delivery could not be turned into an event.
#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("broker error: {0}")]
    Broker(#[from] rdkafka::error::KafkaError),

    #[error("delivered message has no payload")]
    EmptyPayload,

    #[error("failed to decode event: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Kafka consumer for order-placed events.
///
/// Offsets are committed manually, only after the subscriber has applied
/// (or deduplicated) the event's side effects: a crash before commit
/// means the broker redelivers, which is the whole retry story — the
/// consumer keeps no retry bookkeeping of its own. Messages within one
/// partition arrive strictly in send order.
pub struct OrderEventConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl OrderEventConsumer {
    /// Create a consumer subscribed to the configured topic under the
    /// configured consumer group.
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group = %config.consumer_group,
            "Initializing Kafka consumer"
        );

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.consumer_group)
            // Offset management
            .set("enable.auto.commit", "false") // Manual commit after processing
            .set("auto.offset.reset", "earliest")
            // Session management
            .set("session.timeout.ms", "30000")
            .set("heartbeat.interval.ms", "3000")
            .set("max.poll.interval.ms", "300000")
            .create()
            .context("Failed to create Kafka consumer")?;

        consumer
            .subscribe(&[&config.topic])
            .context("Failed to subscribe to Kafka topic")?;

        info!("Kafka consumer initialized");

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }

    /// Wait for the next delivered event and decode it.
    pub async fn recv(&self) -> Result<OrderPlacedEvent, ConsumeError> {
        let message = self.consumer.recv().await?;

        let payload = message.payload().ok_or(ConsumeError::EmptyPayload)?;
        let event: OrderPlacedEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }

    /// Commit the current offset, acknowledging everything processed so
    /// far. Skipping this on failure is what makes redelivery happen.
    pub fn commit(&self) -> Result<()> {
        self.consumer
            .commit_consumer_state(CommitMode::Sync)
            .context("Failed to commit offset")?;
        Ok(())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}
