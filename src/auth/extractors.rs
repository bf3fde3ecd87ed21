// ============================================================================
// Axum Extractors
// ============================================================================
//
// The authorization side of the gate: handlers declare the access level
// they need by the extractor they take.
//
// - CurrentUser: any authenticated principal (401 otherwise)
// - AdminUser:   principal holding the ADMIN role (401/403 otherwise)
//
// Anonymous-friendly handlers simply take no principal extractor.
//
// ============================================================================

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::claims::{Principal, Role};
use crate::error::AppError;

/// Extractor requiring an authenticated principal.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::auth("authentication required"))
    }
}

/// Extractor requiring a principal with the ADMIN role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;
        if !principal.has_role(Role::Admin) {
            return Err(AppError::forbidden("admin role required"));
        }
        Ok(AdminUser(principal))
    }
}
