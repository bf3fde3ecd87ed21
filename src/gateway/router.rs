// ============================================================================
// Gateway Router
// ============================================================================
//
// Routes requests to the service owning the path:
// - /api/v1/auth/*        → auth-service
// - /api/v1/orders*       → order-service
// - /api/v1/restaurants*  → restaurant-service
//
// The authentication gate runs in front of this router; requests are
// forwarded with their original Authorization header either way, and
// each service re-runs the gate against the shared secret.
//
// ============================================================================

use axum::{
    body::Body,
    extract::{Request, State},
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::UpstreamConfig;
use crate::error::AppError;
use crate::gateway::service_client::ServiceClient;

/// Gateway state shared across requests.
pub struct GatewayState {
    pub upstreams: UpstreamConfig,
    pub client: ServiceClient,
}

impl GatewayState {
    /// Resolve the upstream owning a path, if any.
    pub fn upstream_for(&self, path: &str) -> Option<(&'static str, &str)> {
        if path.starts_with("/api/v1/auth") {
            Some(("auth", self.upstreams.auth_url.as_str()))
        } else if path.starts_with("/api/v1/orders") {
            Some(("order", self.upstreams.order_url.as_str()))
        } else if path.starts_with("/api/v1/restaurants") {
            Some(("restaurant", self.upstreams.restaurant_url.as_str()))
        } else {
            None
        }
    }
}

/// Forward a request to the service owning its path.
pub async fn route_request(
    State(state): State<Arc<GatewayState>>,
    request: Request<Body>,
) -> Result<Response<Body>, AppError> {
    let path = request.uri().path().to_string();

    let (service_name, service_url) = state
        .upstream_for(&path)
        .ok_or_else(|| AppError::not_found(format!("no service owns {path}")))?;

    debug!(service = service_name, path = %path, "routing request");

    state
        .client
        .forward_request(service_url, request)
        .await
        .map_err(|e| {
            error!(service = service_name, error = %e, "request forwarding failed");
            AppError::upstream(format!("{service_name} unavailable"))
        })
}
