// ============================================================================
// Service Client
// ============================================================================
//
// HTTP client for forwarding gateway requests to the services behind it.
// Handles request forwarding, response proxying, and error reporting.
//
// ============================================================================

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, Response};
use std::time::Duration;
use tracing::warn;

use crate::config::MAX_REQUEST_BODY_SIZE;

/// HTTP client for communicating with upstream services.
pub struct ServiceClient {
    client: reqwest::Client,
}

impl ServiceClient {
    pub fn new(timeout_secs: u64) -> Self {
        // Connection pooling and keep-alive for service-to-service traffic
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Forward an HTTP request to a service and proxy the response back.
    ///
    /// The original headers — including `Authorization` — travel with the
    /// request, so each service can run the authentication gate itself.
    pub async fn forward_request(
        &self,
        service_url: &str,
        request: Request<Body>,
    ) -> Result<Response<Body>> {
        // Build target URL
        let path = request.uri().path();
        let target_url = match request.uri().query() {
            Some(query) => format!("{service_url}{path}?{query}"),
            None => format!("{service_url}{path}"),
        };

        let method = request.method().clone();
        let headers = request.headers().clone();

        let (_parts, body) = request.into_parts();
        let body_bytes = axum::body::to_bytes(body, MAX_REQUEST_BODY_SIZE).await?;

        let mut upstream_request = self.client.request(method, &target_url);

        // Copy headers (except Host, which reqwest sets itself)
        for (key, value) in headers.iter() {
            if key != "host" {
                upstream_request = upstream_request.header(key, value);
            }
        }

        if !body_bytes.is_empty() {
            upstream_request = upstream_request.body(body_bytes.to_vec());
        }

        let response = upstream_request.send().await?;

        // Convert the reqwest response back into an Axum response
        let status = response.status();
        let mut proxied = Response::builder().status(status);
        for (key, value) in response.headers().iter() {
            proxied = proxied.header(key, value);
        }

        let response_bytes = response.bytes().await?;
        Ok(proxied
            .body(Body::from(response_bytes.to_vec()))
            .map_err(|e| anyhow::anyhow!("Failed to build response: {}", e))?)
    }

    /// Check whether a service answers its health endpoint.
    pub async fn check_health(&self, service_url: &str) -> bool {
        let health_url = format!("{service_url}/health");
        match self
            .client
            .get(&health_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(service_url = %service_url, error = %e, "Service health check failed");
                false
            }
        }
    }
}
