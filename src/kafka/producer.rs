use anyhow::{Context, Result};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::config::KafkaConfig;
use crate::kafka::types::OrderPlacedEvent;

/// Why a publish did not reach the broker.
///
/// Publish failures are returned to the caller instead of being
/// swallowed: the commit path decides what to do with them. The local
/// write is never unwound — publishing is at-most-once unless the
/// caller adds its own retry.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event failed validation: {0}")]
    InvalidEvent(String),

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("broker rejected write: {0}")]
    Broker(#[from] rdkafka::error::KafkaError),
}

/// Kafka producer for order-placed events.
///
/// Configured for:
/// - `acks=all`: wait for all in-sync replicas
/// - `enable.idempotence=true`: no duplicates within a producer session
/// - partition key = orderId: per-order delivery ordering
pub struct OrderEventProducer {
    producer: Arc<FutureProducer>,
    topic: String,
    send_timeout: Duration,
    enabled: bool,
}

impl OrderEventProducer {
    /// Create a producer from the application configuration.
    ///
    /// With `enabled=false` the producer accepts events and reports
    /// dummy coordinates without touching a broker (local dev / tests).
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        if !config.enabled {
            info!("Kafka producer disabled (KAFKA_ENABLED=false)");
            let producer = ClientConfig::new()
                .set("bootstrap.servers", &config.brokers)
                .create()
                .context("Failed to create disabled Kafka producer")?;

            return Ok(Self {
                producer: Arc::new(producer),
                topic: config.topic.clone(),
                send_timeout: Duration::from_millis(config.send_timeout_ms),
                enabled: false,
            });
        }

        info!("Initializing Kafka producer...");
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            // Reliability settings
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("max.in.flight.requests.per.connection", "5")
            // Performance settings
            .set("linger.ms", "10")
            .set("batch.size", "16384")
            // Timeout settings
            .set("request.timeout.ms", "30000")
            .set("delivery.timeout.ms", "120000")
            .create()
            .context("Failed to create Kafka producer")?;

        info!(topic = %config.topic, "Kafka producer initialized");

        Ok(Self {
            producer: Arc::new(producer),
            topic: config.topic.clone(),
            send_timeout: Duration::from_millis(config.send_timeout_ms),
            enabled: true,
        })
    }

    /// Publish one event, keyed by its orderId.
    ///
    /// Waits for broker acknowledgment up to the configured send
    /// timeout. Returns the partition and offset of the written record,
    /// or the failure the caller must act on. There is no in-band retry.
    pub async fn publish(&self, event: &OrderPlacedEvent) -> Result<(i32, i64), PublishError> {
        if !self.enabled {
            return Ok((-1, -1)); // Dummy partition/offset
        }

        event
            .validate()
            .map_err(|e| PublishError::InvalidEvent(e.to_string()))?;

        let payload = serde_json::to_vec(event)?;
        let key = event.partition_key();

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        match self
            .producer
            .send(record, Timeout::After(self.send_timeout))
            .await
        {
            Ok((partition, offset)) => {
                info!(
                    partition = partition,
                    offset = offset,
                    order_id = event.order_id,
                    "OrderPlacedEvent published"
                );
                Ok((partition, offset))
            }
            Err((kafka_err, _)) => {
                error!(
                    error = %kafka_err,
                    order_id = event.order_id,
                    topic = %self.topic,
                    "Failed to publish OrderPlacedEvent"
                );
                Err(PublishError::Broker(kafka_err))
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Flush pending messages before shutdown.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        self.producer
            .flush(Timeout::After(timeout))
            .context("Failed to flush Kafka producer")?;
        Ok(())
    }
}

// Clone shares the underlying producer via Arc.
impl Clone for OrderEventProducer {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
            topic: self.topic.clone(),
            send_timeout: self.send_timeout,
            enabled: self.enabled,
        }
    }
}
