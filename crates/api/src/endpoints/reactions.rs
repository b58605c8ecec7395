//! Reaction endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use snapfeed_common::AppResult;

use crate::{extractors::AuthUser, middleware::AppState};

/// React request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    pub post_id: String,
    /// `"like"` or `"dislike"`; anything else is rejected.
    pub kind: String,
}

/// React response with the refreshed counts.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactResponse {
    pub success: bool,
    pub like_count: i32,
    pub dislike_count: i32,
}

/// Apply a like/dislike vote to a post.
async fn react(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ReactRequest>,
) -> AppResult<Json<ReactResponse>> {
    let tally = state
        .reaction_service
        .react(&user.id, &req.post_id, &req.kind)
        .await?;

    Ok(Json(ReactResponse {
        success: true,
        like_count: tally.like_count,
        dislike_count: tally.dislike_count,
    }))
}

/// Reaction state request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRequest {
    pub post_id: String,
}

/// Reaction state response; `kind` is null when neutral.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub kind: Option<&'static str>,
}

/// The acting user's current reaction state on a post.
async fn state(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<StateRequest>,
) -> AppResult<Json<StateResponse>> {
    let kind = state
        .reaction_service
        .current(&user.id, &req.post_id)
        .await?;

    Ok(Json(StateResponse {
        kind: kind.map(snapfeed_db::entities::reaction::ReactionKind::as_str),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/react", post(react))
        .route("/state", post(state))
}
