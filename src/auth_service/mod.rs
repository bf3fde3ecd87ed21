// Auth service: account registry and the token-issuing endpoints.

pub mod handlers;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::authentication_gate;
use crate::auth::service::TokenService;
use store::UserStore;

/// Auth service context (minimal dependencies).
#[derive(Clone)]
pub struct AuthServiceContext {
    pub users: Arc<UserStore>,
    pub tokens: Arc<TokenService>,
}

impl AuthServiceContext {
    pub fn new(users: Arc<UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }
}

/// Build the auth service router with the authentication gate applied.
pub fn router(ctx: Arc<AuthServiceContext>) -> Router {
    let tokens = ctx.tokens.clone();

    Router::new()
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/register-admin", post(handlers::register_admin))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/refresh", post(handlers::refresh))
        .route("/api/v1/auth/me", get(handlers::me))
        .layer(axum::middleware::from_fn_with_state(
            tokens,
            authentication_gate,
        ))
        .with_state(ctx)
}
