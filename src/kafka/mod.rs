// Kafka integration for the order event hand-off.
//
// The producer publishes OrderPlacedEvent after the order service's
// local commit (at-most-once from the producer's perspective); consumers
// subscribe under per-service groups, deduplicate by orderId, and rely
// on uncommitted offsets for redelivery (at-least-once).

pub mod consumer;
pub mod dedup;
pub mod producer;
pub mod types;

pub use consumer::{ConsumeError, OrderEventConsumer};
pub use dedup::{IdempotencyStore, InMemoryIdempotencyStore, RedisIdempotencyStore};
pub use producer::{OrderEventProducer, PublishError};
pub use types::{OrderItemEvent, OrderPlacedEvent};
