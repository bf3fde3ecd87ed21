// Restaurant service: restaurant registry, and the kitchen board fed by
// the order event listener.

pub mod handlers;
pub mod kitchen;
pub mod listener;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::authentication_gate;
use crate::auth::service::TokenService;
use kitchen::KitchenBoard;
use store::RestaurantStore;

/// Restaurant service context.
#[derive(Clone)]
pub struct RestaurantServiceContext {
    pub restaurants: Arc<RestaurantStore>,
    pub kitchen: Arc<KitchenBoard>,
    pub tokens: Arc<TokenService>,
}

impl RestaurantServiceContext {
    pub fn new(
        restaurants: Arc<RestaurantStore>,
        kitchen: Arc<KitchenBoard>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            restaurants,
            kitchen,
            tokens,
        }
    }
}

/// Build the restaurant service router with the authentication gate applied.
pub fn router(ctx: Arc<RestaurantServiceContext>) -> Router {
    let tokens = ctx.tokens.clone();

    Router::new()
        .route(
            "/api/v1/restaurants",
            post(handlers::create_restaurant).get(handlers::list_restaurants),
        )
        .route("/api/v1/restaurants/{id}", get(handlers::get_restaurant))
        .route(
            "/api/v1/restaurants/{id}/orders",
            get(handlers::kitchen_orders),
        )
        .layer(axum::middleware::from_fn_with_state(
            tokens,
            authentication_gate,
        ))
        .with_state(ctx)
}
