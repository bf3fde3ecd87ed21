// ============================================================================
// Gateway & Authentication Gate Tests
// ============================================================================
//
// The gate's contract over real HTTP:
// - requests without (or with broken) credentials are forwarded, not
//   rejected — just without a principal
// - valid bearer tokens attach a request-scoped principal
//
// Plus gateway routing: path-prefix forwarding to a stub upstream with
// headers (including Authorization) intact, 404 for unowned paths, 502
// for unreachable upstreams.
//
// ============================================================================

use axum::{extract::Request, routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

use savora_server::auth::{
    authentication_gate, Identity, Principal, Role, RoleSet, TokenService,
};
use savora_server::config::UpstreamConfig;
use savora_server::gateway::{route_request, GatewayState, ServiceClient};

mod test_utils;
use test_utils::{spawn_app, test_auth_config};

/// Handler reporting whether the gate attached a principal.
async fn whoami(request: Request) -> Json<Value> {
    match request.extensions().get::<Principal>() {
        Some(principal) => Json(json!({
            "authenticated": true,
            "subject": principal.subject(),
            "roles": principal.roles(),
        })),
        None => Json(json!({"authenticated": false})),
    }
}

fn gated_app(tokens: Arc<TokenService>) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(
            tokens,
            authentication_gate,
        ))
}

fn customer_identity() -> Identity {
    Identity {
        subject: "ada@example.com".to_string(),
        roles: RoleSet::from([Role::Customer]),
    }
}

#[tokio::test]
async fn test_gate_forwards_anonymous_requests() {
    let tokens = Arc::new(TokenService::new(&test_auth_config()));
    let addr = spawn_app(gated_app(tokens)).await;

    let body: Value = reqwest::get(format!("http://{addr}/whoami"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_gate_attaches_principal_for_valid_token() {
    let tokens = Arc::new(TokenService::new(&test_auth_config()));
    let access_token = tokens.issue_access_token(&customer_identity()).unwrap();
    let addr = spawn_app(gated_app(tokens)).await;

    let body: Value = reqwest::Client::new()
        .get(format!("http://{addr}/whoami"))
        .bearer_auth(&access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["subject"], "ada@example.com");
    assert_eq!(body["roles"], json!(["CUSTOMER"]));
}

#[tokio::test]
async fn test_gate_forwards_bad_tokens_unauthenticated() {
    let tokens = Arc::new(TokenService::new(&test_auth_config()));
    let access_token = tokens.issue_access_token(&customer_identity()).unwrap();
    let addr = spawn_app(gated_app(tokens)).await;
    let client = reqwest::Client::new();

    // Tampered signature: still forwarded, no principal, no rejection.
    let mut tampered = access_token.clone();
    let flipped = if tampered.ends_with('A') { 'B' } else { 'A' };
    tampered.pop();
    tampered.push(flipped);

    let response = client
        .get(format!("http://{addr}/whoami"))
        .bearer_auth(&tampered)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["authenticated"], false);

    // Non-Bearer scheme is ignored entirely.
    let body: Value = client
        .get(format!("http://{addr}/whoami"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["authenticated"], false);
}

// ---------------------------------------------------------------------------
// Gateway routing
// ---------------------------------------------------------------------------

/// Stub upstream echoing its path and received Authorization header.
async fn spawn_stub_upstream() -> SocketAddr {
    async fn echo(request: axum::extract::Request) -> Json<Value> {
        let auth = request
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Json(json!({
            "path": request.uri().path(),
            "authorization": auth,
        }))
    }

    spawn_app(Router::new().fallback(echo)).await
}

async fn spawn_gateway(upstreams: UpstreamConfig) -> SocketAddr {
    let tokens = Arc::new(TokenService::new(&test_auth_config()));
    let state = Arc::new(GatewayState {
        upstreams,
        client: ServiceClient::new(5),
    });

    let app = Router::new()
        .fallback(route_request)
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            tokens,
            authentication_gate,
        ));
    spawn_app(app).await
}

#[tokio::test]
async fn test_gateway_forwards_to_owning_service() {
    let upstream = spawn_stub_upstream().await;
    let gateway = spawn_gateway(UpstreamConfig {
        auth_url: format!("http://{upstream}"),
        order_url: format!("http://{upstream}"),
        restaurant_url: format!("http://{upstream}"),
    })
    .await;

    let tokens = TokenService::new(&test_auth_config());
    let access_token = tokens.issue_access_token(&customer_identity()).unwrap();

    let body: Value = reqwest::Client::new()
        .get(format!("http://{gateway}/api/v1/orders/42"))
        .bearer_auth(&access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["path"], "/api/v1/orders/42");
    // The original bearer header reaches the service, which re-runs the
    // gate itself.
    assert_eq!(
        body["authorization"],
        json!(format!("Bearer {access_token}"))
    );
}

#[tokio::test]
async fn test_gateway_rejects_unowned_paths() {
    let upstream = spawn_stub_upstream().await;
    let gateway = spawn_gateway(UpstreamConfig {
        auth_url: format!("http://{upstream}"),
        order_url: format!("http://{upstream}"),
        restaurant_url: format!("http://{upstream}"),
    })
    .await;

    let response = reqwest::get(format!("http://{gateway}/api/v1/payments"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_gateway_reports_unreachable_upstream() {
    // Nothing listens on this port.
    let gateway = spawn_gateway(UpstreamConfig {
        auth_url: "http://127.0.0.1:9".to_string(),
        order_url: "http://127.0.0.1:9".to_string(),
        restaurant_url: "http://127.0.0.1:9".to_string(),
    })
    .await;

    let response = reqwest::get(format!("http://{gateway}/api/v1/orders"))
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
}
