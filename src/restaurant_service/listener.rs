// ============================================================================
// Order Event Listener
// ============================================================================
//
// Consumes OrderPlacedEvent under the service's consumer group and feeds
// the kitchen board. Per delivered message:
//
// 1. Check the idempotence key (orderId); a recorded key means the side
//    effect already happened — skip it, but still commit.
// 2. Apply the side effect, then record the key.
// 3. Commit the offset. A failure anywhere before commit leaves the
//    offset in place and the broker redelivers; there is no retry
//    bookkeeping and no dead-letter queue here.
//
// ============================================================================

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::kafka::consumer::{ConsumeError, OrderEventConsumer};
use crate::kafka::dedup::IdempotencyStore;
use crate::kafka::types::OrderPlacedEvent;
use crate::restaurant_service::kitchen::OrderPlacedHandler;

/// What became of one delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Side effect applied and idempotence key recorded
    Applied,
    /// Idempotence key was already recorded; side effect skipped
    Duplicate,
}

/// Apply one delivered event idempotently.
pub async fn process_event(
    event: &OrderPlacedEvent,
    store: &dyn IdempotencyStore,
    handler: &dyn OrderPlacedHandler,
) -> Result<ProcessOutcome> {
    if store.is_processed(event.order_id).await? {
        debug!(order_id = event.order_id, "duplicate delivery, skipping");
        return Ok(ProcessOutcome::Duplicate);
    }

    handler
        .on_order_placed(event)
        .await
        .context("order handler failed")?;

    if !store.mark_processed(event.order_id).await? {
        // Another group member recorded the key first (rebalance race);
        // same-partition deliveries of one order are otherwise serial.
        debug!(order_id = event.order_id, "idempotence key already recorded");
        return Ok(ProcessOutcome::Duplicate);
    }

    Ok(ProcessOutcome::Applied)
}

/// Run the consume loop until the task is aborted.
pub async fn run_listener(
    consumer: OrderEventConsumer,
    store: Arc<dyn IdempotencyStore>,
    handler: Arc<dyn OrderPlacedHandler>,
) {
    loop {
        let event = match consumer.recv().await {
            Ok(event) => event,
            Err(ConsumeError::Broker(e)) => {
                error!(error = %e, "consumer error, continuing");
                continue;
            }
            Err(e) => {
                // Undecodable payload: logged and left uncommitted, per
                // the no-dead-letter policy.
                warn!(error = %e, "skipping undecodable delivery");
                continue;
            }
        };

        match process_event(&event, store.as_ref(), handler.as_ref()).await {
            Ok(outcome) => {
                debug!(order_id = event.order_id, ?outcome, "event processed");
                if let Err(e) = consumer.commit() {
                    warn!(order_id = event.order_id, error = %e, "offset commit failed");
                }
            }
            Err(e) => {
                warn!(
                    order_id = event.order_id,
                    error = %e,
                    "processing failed, leaving offset uncommitted for redelivery"
                );
            }
        }
    }
}
