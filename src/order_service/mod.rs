// Order service: order intake and the order-placed event hand-off.

pub mod handlers;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::authentication_gate;
use crate::auth::service::TokenService;
use crate::kafka::producer::OrderEventProducer;
use store::OrderStore;

/// Order service context.
#[derive(Clone)]
pub struct OrderServiceContext {
    pub orders: Arc<OrderStore>,
    pub producer: Arc<OrderEventProducer>,
    pub tokens: Arc<TokenService>,
}

impl OrderServiceContext {
    pub fn new(
        orders: Arc<OrderStore>,
        producer: Arc<OrderEventProducer>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            orders,
            producer,
            tokens,
        }
    }
}

/// Build the order service router with the authentication gate applied.
pub fn router(ctx: Arc<OrderServiceContext>) -> Router {
    let tokens = ctx.tokens.clone();

    Router::new()
        .route(
            "/api/v1/orders",
            post(handlers::create_order).get(handlers::list_orders),
        )
        .route("/api/v1/orders/{id}", get(handlers::get_order))
        .layer(axum::middleware::from_fn_with_state(
            tokens,
            authentication_gate,
        ))
        .with_state(ctx)
}
