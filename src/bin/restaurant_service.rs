// ============================================================================
// Restaurant Service
// ============================================================================
//
// Restaurant registry plus the kitchen board: a consumer in the
// "restaurant-group" applies each OrderPlacedEvent to the board exactly
// once, deduplicating redeliveries by orderId. With REDIS_URL set the
// idempotence keys are shared across instances; otherwise they are
// process-local.
//
// ============================================================================

use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use savora_server::auth::TokenService;
use savora_server::config::Config;
use savora_server::kafka::{
    IdempotencyStore, InMemoryIdempotencyStore, OrderEventConsumer, RedisIdempotencyStore,
};
use savora_server::restaurant_service::{
    kitchen::KitchenBoard, listener::run_listener, store::RestaurantStore,
    RestaurantServiceContext,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Restaurant Service Starting ===");
    info!("Port: {}", config.restaurant_port);
    info!("Kafka enabled: {}", config.kafka.enabled);
    info!("Consumer group: {}", config.kafka.consumer_group);

    let tokens = Arc::new(TokenService::new(&config.auth));
    let restaurants = Arc::new(RestaurantStore::new());
    let kitchen = Arc::new(KitchenBoard::new());

    if config.kafka.enabled {
        let consumer =
            OrderEventConsumer::new(&config.kafka).context("Failed to create Kafka consumer")?;

        let store: Arc<dyn IdempotencyStore> = match &config.redis_url {
            Some(url) => {
                info!("Using Redis-backed idempotence keys");
                Arc::new(
                    RedisIdempotencyStore::connect(url, &config.kafka.consumer_group)
                        .await
                        .context("Failed to connect idempotency store")?,
                )
            }
            None => {
                info!("Using in-memory idempotence keys");
                Arc::new(InMemoryIdempotencyStore::new())
            }
        };

        let board = kitchen.clone();
        tokio::spawn(async move {
            run_listener(consumer, store, board).await;
        });
    } else {
        info!("Kafka disabled, order event listener not started");
    }

    let ctx = Arc::new(RestaurantServiceContext::new(restaurants, kitchen, tokens));

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(savora_server::restaurant_service::router(ctx))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.restaurant_port));
    info!("Restaurant service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind restaurant service port")?;
    axum::serve(listener, app)
        .await
        .context("Restaurant service crashed")?;

    Ok(())
}
