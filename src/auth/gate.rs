// ============================================================================
// Authentication Gate
// ============================================================================
//
// Request-boundary middleware shared by the gateway and the services
// behind it. Converts an `Authorization: Bearer <token>` header into a
// request-scoped principal:
//
// 1. No header / not a Bearer header → forward unauthenticated
// 2. Token fails validation          → forward unauthenticated
// 3. Token verifies                  → attach Principal, forward
//
// The gate never rejects a request; whether anonymous access is allowed
// is an authorization decision made downstream (see extractors.rs).
//
// ============================================================================

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::service::TokenService;

/// Extract the bearer token from a request's headers, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Axum middleware attaching an authenticated principal to the request.
///
/// The principal lives in the request's extensions: it propagates through
/// the request's own async continuation and is invisible to concurrently
/// processed requests. Validation is pure signature/expiry checking, so
/// the gate never performs network I/O.
pub async fn authentication_gate(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match tokens.authenticate(token) {
            Some(principal) => {
                debug!(subject = %principal.subject(), "request authenticated");
                request.extensions_mut().insert(principal);
            }
            // All validation failures collapse to "unauthenticated" here;
            // the specific reason was already logged by the token service.
            None => debug!("bearer token rejected, continuing unauthenticated"),
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
