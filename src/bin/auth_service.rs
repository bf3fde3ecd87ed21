// ============================================================================
// Auth Service
// ============================================================================
//
// Handles:
// - User registration (customer and admin accounts)
// - Login (credential check, access + refresh token issuance)
// - Token refresh
//
// Stateless token validation: every other service verifies tokens with
// the shared secret, no callback to this service required.
//
// ============================================================================

use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use savora_server::auth::TokenService;
use savora_server::auth_service::{store::UserStore, AuthServiceContext};
use savora_server::config::Config;
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

    info!("=== Auth Service Starting ===");
    info!("Port: {}", config.auth_port);

    let tokens = Arc::new(TokenService::new(&config.auth));
    let users = Arc::new(UserStore::new());
    let ctx = Arc::new(AuthServiceContext::new(users, tokens));

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(savora_server::auth_service::router(ctx))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.auth_port));
    info!("Auth service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind auth service port")?;
    axum::serve(listener, app)
        .await
        .context("Auth service crashed")?;

    Ok(())
}
