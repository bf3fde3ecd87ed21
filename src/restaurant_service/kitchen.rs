use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::kafka::types::OrderPlacedEvent;

/// Side effect applied for each delivered order event.
///
/// Implementations must be safe to call concurrently for DIFFERENT
/// orders; same-order calls are already serialized by the broker's
/// per-partition ordering.
#[async_trait]
pub trait OrderPlacedHandler: Send + Sync {
    async fn on_order_placed(&self, event: &OrderPlacedEvent) -> Result<()>;
}

/// An incoming order as the kitchen sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenTicket {
    pub order_id: i64,
    pub customer_id: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub placed_at: DateTime<Utc>,
    pub item_count: usize,
}

/// Per-restaurant queue of incoming orders.
///
/// This is the restaurant service's local side-effect state for the
/// event stream; tickets for one restaurant appear in event emission
/// order.
#[derive(Default)]
pub struct KitchenBoard {
    tickets: RwLock<HashMap<i64, Vec<KitchenTicket>>>,
}

impl KitchenBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tickets_for(&self, restaurant_id: i64) -> Vec<KitchenTicket> {
        self.tickets
            .read()
            .await
            .get(&restaurant_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn ticket_count(&self) -> usize {
        self.tickets.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl OrderPlacedHandler for KitchenBoard {
    async fn on_order_placed(&self, event: &OrderPlacedEvent) -> Result<()> {
        let ticket = KitchenTicket {
            order_id: event.order_id,
            customer_id: event.customer_id,
            total_amount: event.total_amount,
            placed_at: event.order_date,
            item_count: event.order_items.len(),
        };

        self.tickets
            .write()
            .await
            .entry(event.restaurant_id)
            .or_default()
            .push(ticket);

        info!(
            order_id = event.order_id,
            restaurant_id = event.restaurant_id,
            "order queued for kitchen"
        );
        Ok(())
    }
}
