use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::auth::extractors::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::order_service::store::{Order, OrderItem};
use crate::order_service::OrderServiceContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub order_items: Vec<OrderItemRequest>,
}

/// POST /api/v1/orders — commit an order, then notify subscribers.
///
/// The event publish is a tail operation after the local commit: its
/// failure is logged and reported nowhere else, and the committed order
/// stands either way. No lock is held across the publish.
pub async fn create_order(
    State(ctx): State<Arc<OrderServiceContext>>,
    CurrentUser(principal): CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    if req.order_items.is_empty() {
        return Err(AppError::validation("an order needs at least one item"));
    }
    if req.order_items.iter().any(|item| item.quantity == 0) {
        return Err(AppError::validation("item quantity must be at least 1"));
    }

    let total_amount: Decimal = req
        .order_items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();

    let order_items: Vec<OrderItem> = req
        .order_items
        .into_iter()
        .map(|item| OrderItem {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();

    let order = ctx
        .orders
        .insert(
            req.customer_id,
            req.restaurant_id,
            total_amount,
            order_items,
            Utc::now(),
        )
        .await;

    info!(
        order_id = order.id,
        subject = %principal.subject(),
        "order committed"
    );

    match ctx.producer.publish(&order.to_event()).await {
        Ok((partition, offset)) => {
            info!(order_id = order.id, partition, offset, "order event published");
        }
        Err(e) => {
            // Best-effort notification: the committed order stands.
            error!(
                order_id = order.id,
                error = %e,
                "order committed but event publish failed"
            );
        }
    }

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/v1/orders
pub async fn list_orders(
    State(ctx): State<Arc<OrderServiceContext>>,
    _user: CurrentUser,
) -> Json<Vec<Order>> {
    Json(ctx.orders.list().await)
}

/// GET /api/v1/orders/{id}
pub async fn get_order(
    State(ctx): State<Arc<OrderServiceContext>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    ctx.orders
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("order {id}")))
}
