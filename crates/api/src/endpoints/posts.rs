//! Post endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use serde::{Deserialize, Serialize};
use snapfeed_common::{AppError, AppResult};
use snapfeed_core::{CreatePostInput, PostView};

use crate::{extractors::AuthUser, middleware::AppState, response::Success};

/// Post response, enriched with the owner's display identity.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub owner_id: String,
    pub description: String,
    pub image_locator: String,
    pub like_count: i32,
    pub dislike_count: i32,
    pub created_at: String,
    pub owner_display_name: String,
    pub owner_avatar_locator: String,
}

impl From<PostView> for PostResponse {
    fn from(view: PostView) -> Self {
        Self {
            id: view.post.id,
            owner_id: view.post.user_id,
            description: view.post.description,
            image_locator: view.post.image_url,
            like_count: view.post.like_count,
            dislike_count: view.post.dislike_count,
            created_at: view.post.created_at.to_rfc3339(),
            owner_display_name: view.owner_display_name,
            owner_avatar_locator: view.owner_avatar_url,
        }
    }
}

/// Create a post via multipart form (`description` + `image` file).
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<PostResponse>> {
    let mut description: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "description" => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            "image" => {
                file_name = field.file_name().map(std::string::ToString::to_string);
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let description = description
        .ok_or_else(|| AppError::Validation("Post description is required".to_string()))?;
    let data =
        file_data.ok_or_else(|| AppError::Validation("Post image is required".to_string()))?;
    let file_name = file_name
        .ok_or_else(|| AppError::Validation("Post image is required".to_string()))?;

    let input = CreatePostInput {
        description,
        file_name,
        data,
    };

    let view = state.post_service.create(&user.id, input).await?;
    Ok(Json(view.into()))
}

/// Delete post request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostRequest {
    pub post_id: String,
}

/// Delete a post. Only the owner may delete it.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeletePostRequest>,
) -> AppResult<Json<Success>> {
    state.post_service.delete(&req.post_id, &user.id).await?;
    Ok(Json(Success::new()))
}

/// List posts request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsRequest {
    /// Owner whose posts to list; defaults to the acting user.
    pub user_id: Option<String>,
}

/// List an owner's posts, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListPostsRequest>,
) -> AppResult<Json<Vec<PostResponse>>> {
    let owner_id = req.user_id.as_deref().unwrap_or(&user.id);
    let views = state.post_service.list_by_owner(owner_id).await?;

    Ok(Json(views.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/delete", post(delete))
        .route("/list", post(list))
}
