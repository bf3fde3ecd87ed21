// ============================================================================
// Idempotence keys for event consumers
// ============================================================================
//
// At-least-once delivery means every subscriber must tolerate seeing the
// same OrderPlacedEvent again. The idempotence key is the orderId: once
// it is recorded, redeliveries are skipped without reapplying side
// effects.
//
// The key is recorded AFTER the side effect succeeds. A crash in between
// redelivers the event, and the not-yet-recorded key lets it apply again
// — duplicates are suppressed, losses are not possible.
//
// ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashSet;
use tokio::sync::Mutex;

// Processed keys live long enough to outlast any plausible redelivery
// window (broker retention is the practical upper bound).
const PROCESSED_KEY_TTL_SECS: u64 = 7 * 24 * 3600;

/// Records which order ids a consumer has already applied.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Whether this order id has already been recorded.
    async fn is_processed(&self, order_id: i64) -> Result<bool>;

    /// Record the order id. Returns `false` if it was already present
    /// (another worker finished first after a rebalance).
    async fn mark_processed(&self, order_id: i64) -> Result<bool>;
}

/// Process-local store for single-instance consumers and tests.
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    seen: Mutex<HashSet<i64>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn is_processed(&self, order_id: i64) -> Result<bool> {
        Ok(self.seen.lock().await.contains(&order_id))
    }

    async fn mark_processed(&self, order_id: i64) -> Result<bool> {
        Ok(self.seen.lock().await.insert(order_id))
    }
}

/// Redis-backed store shared by all instances of a consumer group.
///
/// Keys: `processed_order:{consumer_group}:{order_id}`, recorded with
/// `SET NX EX` so marking is an atomic check-and-set.
pub struct RedisIdempotencyStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisIdempotencyStore {
    pub async fn connect(redis_url: &str, consumer_group: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Invalid Redis URL")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self {
            conn,
            key_prefix: format!("processed_order:{consumer_group}:"),
        })
    }

    fn key_for(&self, order_id: i64) -> String {
        format!("{}{}", self.key_prefix, order_id)
    }
}

#[async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    async fn is_processed(&self, order_id: i64) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: i64 = redis::cmd("EXISTS")
            .arg(self.key_for(order_id))
            .query_async(&mut conn)
            .await
            .context("Failed to check idempotence key")?;
        Ok(exists > 0)
    }

    async fn mark_processed(&self, order_id: i64) -> Result<bool> {
        let mut conn = self.conn.clone();
        let set: Option<String> = redis::cmd("SET")
            .arg(self.key_for(order_id))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(PROCESSED_KEY_TTL_SECS)
            .query_async(&mut conn)
            .await
            .context("Failed to record idempotence key")?;
        Ok(set.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_check_and_set() {
        let store = InMemoryIdempotencyStore::new();

        assert!(!store.is_processed(42).await.unwrap());
        assert!(store.mark_processed(42).await.unwrap());
        assert!(store.is_processed(42).await.unwrap());

        // Second mark reports the key was already present.
        assert!(!store.mark_processed(42).await.unwrap());

        // Unrelated orders are unaffected.
        assert!(!store.is_processed(43).await.unwrap());
    }
}
