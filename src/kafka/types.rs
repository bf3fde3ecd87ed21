use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line item of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemEvent {
    pub product_id: i64,
    pub quantity: u32,
    /// Unit price, serialized as a decimal string (never a float)
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// Domain event emitted once, after the order service commits an order.
///
/// This structure IS the wire contract: field names and types are fixed
/// and owned by the producer. The Kafka partition key is the `order_id`,
/// so all events for one order reach the same consumer in emission
/// order. The event is never mutated and never deleted; subscribers may
/// observe it more than once (at-least-once delivery) and deduplicate by
/// `order_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedEvent {
    pub order_id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    /// Exact total, serialized as a decimal string
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    /// Order creation timestamp, ISO-8601
    pub order_date: DateTime<Utc>,
    pub order_items: Vec<OrderItemEvent>,
}

impl OrderPlacedEvent {
    /// Partition/ordering key for the broker.
    pub fn partition_key(&self) -> String {
        self.order_id.to_string()
    }

    /// Validate event structure before sending.
    pub fn validate(&self) -> Result<()> {
        if self.order_id <= 0 {
            anyhow::bail!("order_id must be positive");
        }
        if self.customer_id <= 0 {
            anyhow::bail!("customer_id must be positive");
        }
        if self.restaurant_id <= 0 {
            anyhow::bail!("restaurant_id must be positive");
        }
        if self.order_items.is_empty() {
            anyhow::bail!("order_items must not be empty");
        }
        for item in &self.order_items {
            if item.quantity == 0 {
                anyhow::bail!("order item quantity must be at least 1");
            }
        }
        Ok(())
    }
}
