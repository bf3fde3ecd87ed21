use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub products: Vec<Product>,
}

/// In-memory restaurant registry.
#[derive(Default)]
pub struct RestaurantStore {
    restaurants: RwLock<HashMap<i64, Restaurant>>,
    next_id: AtomicI64,
}

impl RestaurantStore {
    pub fn new() -> Self {
        Self {
            restaurants: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn insert(&self, name: &str, address: &str, products: Vec<Product>) -> Restaurant {
        let restaurant = Restaurant {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            address: address.to_string(),
            products,
        };
        self.restaurants
            .write()
            .await
            .insert(restaurant.id, restaurant.clone());
        restaurant
    }

    pub async fn get(&self, id: i64) -> Option<Restaurant> {
        self.restaurants.read().await.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<Restaurant> {
        let mut all: Vec<Restaurant> = self.restaurants.read().await.values().cloned().collect();
        all.sort_by_key(|restaurant| restaurant.id);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = RestaurantStore::new();
        let restaurant = store
            .insert(
                "Trattoria Da Mario",
                "1 Via Roma",
                vec![Product {
                    product_id: 1,
                    name: "Margherita".to_string(),
                    price: dec!(9.99),
                }],
            )
            .await;

        assert_eq!(restaurant.id, 1);
        assert_eq!(store.list().await.len(), 1);
        assert_eq!(store.get(1).await.unwrap().name, "Trattoria Da Mario");
        assert!(store.get(2).await.is_none());
    }
}
