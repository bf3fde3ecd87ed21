// Shared helpers for integration tests.

use axum::Router;
use savora_server::config::AuthConfig;
use std::net::SocketAddr;

/// Token configuration used by every test service.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        token_secret: "integration-test-secret".to_string(),
        access_token_ttl_hours: 1,
        refresh_token_ttl_days: 30,
    }
}

/// Serve a router on an ephemeral local port and return its address.
pub async fn spawn_app(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test app crashed");
    });

    addr
}
