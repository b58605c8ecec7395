//! Post service: orchestrates media storage, persistence and display
//! enrichment.

use crate::services::media::MediaService;
use snapfeed_common::{AppError, AppResult, IdGenerator};
use snapfeed_db::{
    entities::post,
    repositories::{PostRepository, UserRepository},
};
use sea_orm::Set;

/// Display name used when the owner lookup fails.
const DEFAULT_DISPLAY_NAME: &str = "User";

/// Avatar shown for owners without one (or when the lookup fails).
const DEFAULT_AVATAR_URL: &str = "/files/avatars/default.png";

/// Input for creating a new post.
pub struct CreatePostInput {
    /// Post text, must be non-empty after trimming.
    pub description: String,
    /// Original file name of the uploaded image.
    pub file_name: String,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

/// A post enriched with its owner's display identity, ready for rendering
/// without a second round trip.
#[derive(Debug, Clone)]
pub struct PostView {
    /// The post row.
    pub post: post::Model,
    /// Owner display name (falls back to a default identity).
    pub owner_display_name: String,
    /// Owner avatar URL (falls back to the default avatar).
    pub owner_avatar_url: String,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    media: MediaService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(post_repo: PostRepository, user_repo: UserRepository, media: MediaService) -> Self {
        Self {
            post_repo,
            user_repo,
            media,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post with an attached image.
    ///
    /// Validation runs before anything touches storage; the image is written
    /// before the row insert so a failed insert can never leave a post row
    /// referencing missing media.
    pub async fn create(&self, owner_id: &str, input: CreatePostInput) -> AppResult<PostView> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "Post description is required".to_string(),
            ));
        }
        if input.file_name.is_empty() {
            return Err(AppError::Validation(
                "Post image is required".to_string(),
            ));
        }

        let media = self.media.store(&input.file_name, &input.data).await?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(owner_id.to_string()),
            description: Set(description.to_string()),
            image_url: Set(media.url.clone()),
            image_key: Set(media.key.clone()),
            like_count: Set(0),
            dislike_count: Set(0),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = match self.post_repo.create(model).await {
            Ok(created) => created,
            Err(e) => {
                // The stored file is now orphaned; tolerated, but worth a
                // trace for the out-of-band cleanup sweep.
                tracing::warn!(key = %media.key, error = %e, "Post insert failed after media write");
                return Err(e);
            }
        };

        let (owner_display_name, owner_avatar_url) = self.owner_display(owner_id).await;

        tracing::info!(post_id = %created.id, owner_id = %owner_id, "Created post");

        Ok(PostView {
            post: created,
            owner_display_name,
            owner_avatar_url,
        })
    }

    /// Delete a post. Only the owner may delete it.
    pub async fn delete(&self, post_id: &str, acting_user_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if post.user_id != acting_user_id {
            return Err(AppError::Unauthorized);
        }

        // Best-effort: a file already gone from disk never blocks the row
        // delete.
        self.media.remove(&post.image_key).await;

        self.post_repo.delete_with_reactions(post_id).await?;

        tracing::info!(post_id = %post_id, "Deleted post");
        Ok(())
    }

    /// Get a post by ID.
    pub async fn get(&self, post_id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(post_id).await
    }

    /// List an owner's posts, newest first, with display enrichment.
    pub async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<PostView>> {
        let posts = self.post_repo.find_by_owner(owner_id).await?;
        let (owner_display_name, owner_avatar_url) = self.owner_display(owner_id).await;

        Ok(posts
            .into_iter()
            .map(|post| PostView {
                post,
                owner_display_name: owner_display_name.clone(),
                owner_avatar_url: owner_avatar_url.clone(),
            })
            .collect())
    }

    /// Resolve the owner's display name and avatar, substituting the default
    /// identity when the lookup fails so listings never break on a missing
    /// owner join.
    async fn owner_display(&self, owner_id: &str) -> (String, String) {
        match self.user_repo.find_by_id(owner_id).await {
            Ok(Some(user)) => {
                let name = user.name.unwrap_or(user.username);
                let avatar = user
                    .avatar_url
                    .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string());
                (name, avatar)
            }
            Ok(None) => (
                DEFAULT_DISPLAY_NAME.to_string(),
                DEFAULT_AVATAR_URL.to_string(),
            ),
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, error = %e, "Owner lookup failed, using default display identity");
                (
                    DEFAULT_DISPLAY_NAME.to_string(),
                    DEFAULT_AVATAR_URL.to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use snapfeed_common::LocalStorage;
    use snapfeed_db::entities::user;
    use std::sync::Arc;

    fn temp_media() -> MediaService {
        let dir = std::env::temp_dir().join(format!(
            "snapfeed-post-test-{}",
            ulid::Ulid::new().to_string().to_lowercase()
        ));
        MediaService::new(Arc::new(LocalStorage::new(dir, "/files".to_string())))
    }

    fn create_test_post(id: &str, user_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            description: "hello".to_string(),
            image_url: format!("/files/{id}.png"),
            image_key: format!("{id}.png"),
            like_count: 0,
            dislike_count: 0,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            password_hash: "$argon2id$test".to_string(),
            token: None,
            name: Some("Alice Example".to_string()),
            avatar_url: Some("/files/a.png".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(post_db: MockDatabase, user_db: MockDatabase) -> PostService {
        PostService::new(
            PostRepository::new(Arc::new(post_db.into_connection())),
            UserRepository::new(Arc::new(user_db.into_connection())),
            temp_media(),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_empty_description() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = CreatePostInput {
            description: "   ".to_string(),
            file_name: "photo.png".to_string(),
            data: b"png".to_vec(),
        };

        let result = service.create("u1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_extension_before_insert() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = CreatePostInput {
            description: "totally safe".to_string(),
            file_name: "virus.exe".to_string(),
            data: b"MZ".to_vec(),
        };

        let result = service.create("u1", input).await;
        assert!(matches!(result, Err(AppError::UnsupportedMediaType(_))));
    }

    #[tokio::test]
    async fn test_create_enriches_with_owner_display() {
        let created = create_test_post("p1", "u1");
        let owner = create_test_user("u1", "alice");

        let post_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[created.clone()]]);
        let user_db =
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[owner]]);

        let service = service(post_db, user_db);

        let input = CreatePostInput {
            description: "hello".to_string(),
            file_name: "photo.png".to_string(),
            data: b"png".to_vec(),
        };

        let view = service.create("u1", input).await.unwrap();
        assert_eq!(view.post.like_count, 0);
        assert_eq!(view.post.dislike_count, 0);
        assert_eq!(view.owner_display_name, "Alice Example");
        assert_eq!(view.owner_avatar_url, "/files/a.png");
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let post_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()]);

        let service = service(post_db, MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.delete("missing", "u1").await;
        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_unauthorized() {
        let post = create_test_post("p1", "u1");

        let post_db =
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[post]]);

        let service = service(post_db, MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.delete("p1", "u2").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_list_by_owner_falls_back_on_missing_owner() {
        let p1 = create_test_post("p1", "ghost");

        let post_db =
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[p1]]);
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);

        let service = service(post_db, user_db);

        let views = service.list_by_owner("ghost").await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].owner_display_name, "User");
        assert_eq!(views[0].owner_avatar_url, "/files/avatars/default.png");
    }
}
