// ============================================================================
// API Gateway
// ============================================================================
//
// Single entry point for clients. The authentication gate validates
// bearer tokens against the shared secret (no callback to the auth
// service) and the router forwards each request to the service owning
// its path. Unauthenticated requests are forwarded too; rejecting them
// is up to the owning service's authorization rules.
//
// ============================================================================

use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use savora_server::auth::{authentication_gate, TokenService};
use savora_server::config::Config;
use savora_server::gateway::{route_request, GatewayState, ServiceClient};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const UPSTREAM_TIMEOUT_SECS: u64 = 30;

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

    info!("=== API Gateway Starting ===");
    info!("Port: {}", config.gateway_port);
    info!("Auth service: {}", config.upstreams.auth_url);
    info!("Order service: {}", config.upstreams.order_url);
    info!("Restaurant service: {}", config.upstreams.restaurant_url);

    let tokens = Arc::new(TokenService::new(&config.auth));
    let state = Arc::new(GatewayState {
        upstreams: config.upstreams.clone(),
        client: ServiceClient::new(UPSTREAM_TIMEOUT_SECS),
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .fallback(route_request)
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            tokens,
            authentication_gate,
        ))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.gateway_port));
    info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind gateway port")?;
    axum::serve(listener, app)
        .await
        .context("Gateway crashed")?;

    Ok(())
}
