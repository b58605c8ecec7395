//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use snapfeed_core::{PostService, ReactionService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Identity provider and session tokens.
    pub user_service: UserService,
    /// Post orchestration.
    pub post_service: PostService,
    /// Reaction engine front.
    pub reaction_service: ReactionService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to a user and stores it in request extensions;
/// requests without a valid token pass through unauthenticated and fail at
/// the [`crate::extractors::AuthUser`] extractor instead.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        if let Ok(user) = state.user_service.authenticate_by_token(token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}
