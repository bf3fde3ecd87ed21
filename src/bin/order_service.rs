// ============================================================================
// Order Service
// ============================================================================
//
// Order intake: commits orders locally, then hands the OrderPlacedEvent
// to Kafka keyed by orderId. Publish failures are logged, never unwind
// the committed order (at-most-once publish by design).
//
// ============================================================================

use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use savora_server::auth::TokenService;
use savora_server::config::Config;
use savora_server::kafka::OrderEventProducer;
use savora_server::order_service::{store::OrderStore, OrderServiceContext};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
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

    info!("=== Order Service Starting ===");
    info!("Port: {}", config.order_port);
    info!("Kafka enabled: {}", config.kafka.enabled);
    info!("Kafka topic: {}", config.kafka.topic);

    let tokens = Arc::new(TokenService::new(&config.auth));
    let producer = Arc::new(
        OrderEventProducer::new(&config.kafka).context("Failed to create Kafka producer")?,
    );
    let orders = Arc::new(OrderStore::new());
    let ctx = Arc::new(OrderServiceContext::new(
        orders,
        producer.clone(),
        tokens,
    ));

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(savora_server::order_service::router(ctx))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.order_port));
    info!("Order service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind order service port")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Order service crashed")?;

    // Drain in-flight events before exiting.
    if let Err(e) = producer.flush(Duration::from_secs(10)) {
        warn!(error = %e, "Kafka producer flush failed during shutdown");
    }

    Ok(())
}
