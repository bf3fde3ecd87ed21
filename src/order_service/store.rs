use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::kafka::types::{OrderItemEvent, OrderPlacedEvent};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// Build the event propagated to downstream services.
    pub fn to_event(&self) -> OrderPlacedEvent {
        OrderPlacedEvent {
            order_id: self.id,
            customer_id: self.customer_id,
            restaurant_id: self.restaurant_id,
            total_amount: self.total_amount,
            order_date: self.order_date,
            order_items: self
                .order_items
                .iter()
                .map(|item| OrderItemEvent {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        }
    }
}

/// In-memory order registry; ids are assigned at insert time.
#[derive(Default)]
pub struct OrderStore {
    orders: RwLock<HashMap<i64, Order>>,
    next_id: AtomicI64,
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Commit a new order, assigning its id and creation timestamp.
    pub async fn insert(
        &self,
        customer_id: i64,
        restaurant_id: i64,
        total_amount: Decimal,
        order_items: Vec<OrderItem>,
        order_date: DateTime<Utc>,
    ) -> Order {
        let order = Order {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            customer_id,
            restaurant_id,
            total_amount,
            order_date,
            order_items,
        };
        self.orders.write().await.insert(order.id, order.clone());
        order
    }

    pub async fn get(&self, id: i64) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by_key(|order| order.id);
        orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = OrderStore::new();
        let items = vec![OrderItem {
            product_id: 1,
            quantity: 1,
            price: dec!(5.00),
        }];

        let first = store
            .insert(7, 3, dec!(5.00), items.clone(), Utc::now())
            .await;
        let second = store.insert(7, 3, dec!(5.00), items, Utc::now()).await;

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.list().await.len(), 2);
        assert!(store.get(1).await.is_some());
        assert!(store.get(99).await.is_none());
    }

    #[tokio::test]
    async fn test_order_to_event_carries_all_fields() {
        let store = OrderStore::new();
        let order = store
            .insert(
                7,
                3,
                dec!(29.97),
                vec![OrderItem {
                    product_id: 1,
                    quantity: 2,
                    price: dec!(9.99),
                }],
                Utc::now(),
            )
            .await;

        let event = order.to_event();
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.customer_id, 7);
        assert_eq!(event.restaurant_id, 3);
        assert_eq!(event.total_amount, dec!(29.97));
        assert_eq!(event.order_items.len(), 1);
        assert!(event.validate().is_ok());
    }
}
