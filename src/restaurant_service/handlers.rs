use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::extractors::{AdminUser, CurrentUser};
use crate::error::{AppError, AppResult};
use crate::restaurant_service::kitchen::KitchenTicket;
use crate::restaurant_service::store::{Product, Restaurant};
use crate::restaurant_service::RestaurantServiceContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRequest {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// POST /api/v1/restaurants — admin only.
pub async fn create_restaurant(
    State(ctx): State<Arc<RestaurantServiceContext>>,
    AdminUser(principal): AdminUser,
    Json(req): Json<RestaurantRequest>,
) -> AppResult<(StatusCode, Json<Restaurant>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("restaurant name is required"));
    }

    let restaurant = ctx
        .restaurants
        .insert(&req.name, &req.address, req.products)
        .await;

    info!(
        restaurant_id = restaurant.id,
        subject = %principal.subject(),
        "restaurant created"
    );
    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// GET /api/v1/restaurants — public listing.
pub async fn list_restaurants(
    State(ctx): State<Arc<RestaurantServiceContext>>,
) -> Json<Vec<Restaurant>> {
    Json(ctx.restaurants.list().await)
}

/// GET /api/v1/restaurants/{id} — public.
pub async fn get_restaurant(
    State(ctx): State<Arc<RestaurantServiceContext>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Restaurant>> {
    ctx.restaurants
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("restaurant {id}")))
}

/// GET /api/v1/restaurants/{id}/orders — the kitchen's incoming queue.
pub async fn kitchen_orders(
    State(ctx): State<Arc<RestaurantServiceContext>>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<KitchenTicket>>> {
    if ctx.restaurants.get(id).await.is_none() {
        return Err(AppError::not_found(format!("restaurant {id}")));
    }
    Ok(Json(ctx.kitchen.tickets_for(id).await))
}
