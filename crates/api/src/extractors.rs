//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use snapfeed_common::AppError;
use snapfeed_db::entities::user;

/// Authenticated user extractor.
///
/// Rejects with `Unauthenticated` before any business logic runs when the
/// auth middleware did not resolve a user for the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The auth middleware stores the resolved user in request extensions
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated)
    }
}
