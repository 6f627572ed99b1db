//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use rollcall_common::AppError;
use rollcall_db::entities::user;

/// Authenticated user extractor.
///
/// Resolved from request extensions, where the auth middleware stored the
/// bearer token's user. A missing user rejects with the standard error
/// envelope rather than a bare status line.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
