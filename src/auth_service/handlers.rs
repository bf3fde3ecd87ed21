use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::claims::{Role, RoleSet};
use crate::auth::extractors::CurrentUser;
use crate::auth_service::AuthServiceContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token, epoch seconds
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub subject: String,
    pub roles: RoleSet,
}

fn validate_registration(req: &RegisterRequest) -> AppResult<()> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::validation("a valid email is required"));
    }
    if req.password.len() < 8 {
        return Err(AppError::validation("password must be at least 8 characters"));
    }
    Ok(())
}

/// POST /api/v1/auth/register — create a CUSTOMER account.
pub async fn register(
    State(ctx): State<Arc<AuthServiceContext>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    validate_registration(&req)?;

    let record = ctx
        .users
        .register(
            &req.first_name,
            &req.last_name,
            &req.email,
            &req.password,
            RoleSet::from([Role::Customer]),
        )
        .await
        .map_err(|e| AppError::validation(e.to_string()))?;

    info!(user_id = record.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"message": "User registered successfully"})),
    ))
}

/// POST /api/v1/auth/register-admin — create an ADMIN account.
pub async fn register_admin(
    State(ctx): State<Arc<AuthServiceContext>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    validate_registration(&req)?;

    let record = ctx
        .users
        .register(
            &req.first_name,
            &req.last_name,
            &req.email,
            &req.password,
            RoleSet::from([Role::Admin, Role::Customer]),
        )
        .await
        .map_err(|e| AppError::validation(e.to_string()))?;

    info!(user_id = record.id, "admin user registered");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"message": "Admin user registered successfully"})),
    ))
}

/// POST /api/v1/auth/login — verify credentials and issue a token pair.
pub async fn login(
    State(ctx): State<Arc<AuthServiceContext>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let record = ctx
        .users
        .verify_credentials(&req.email, &req.password)
        .await
        .ok_or_else(|| AppError::auth("invalid email or password"))?;

    let pair = ctx.tokens.issue_pair(&record.identity())?;

    info!(user_id = record.id, "user logged in");
    Ok(Json(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_at: pair.access_expires_at,
    }))
}

/// POST /api/v1/auth/refresh — exchange a refresh token for a new pair.
///
/// Unlike the gate, this failure is surfaced distinctly: the caller gets
/// an explicit 401 rather than an anonymous pass-through.
pub async fn refresh(
    State(ctx): State<Arc<AuthServiceContext>>,
    Json(req): Json<RefreshTokenRequest>,
) -> AppResult<Json<AuthResponse>> {
    let pair = ctx
        .tokens
        .refresh(&req.refresh_token, ctx.users.as_ref())
        .await?;

    Ok(Json(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_at: pair.access_expires_at,
    }))
}

/// GET /api/v1/auth/me — echo the authenticated principal.
pub async fn me(CurrentUser(principal): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        subject: principal.subject().to_string(),
        roles: principal.roles().clone(),
    })
}
