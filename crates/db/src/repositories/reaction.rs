//! Reaction repository and the like/dislike toggle state machine.

use std::sync::Arc;

use crate::entities::{Post, Reaction, post, reaction, reaction::ReactionKind};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use snapfeed_common::{AppError, AppResult};

/// How often a toggle retries after losing the unique-index race to a
/// concurrent vote by the same user.
const MAX_TOGGLE_ATTEMPTS: u32 = 3;

/// Refreshed per-post counts after a toggle, plus the voter's resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionTally {
    /// Count of `like` rows for the post.
    pub like_count: i32,
    /// Count of `dislike` rows for the post.
    pub dislike_count: i32,
    /// The voter's state after the toggle; `None` is neutral.
    pub state: Option<ReactionKind>,
}

/// The reaction state machine.
///
/// Given the voter's current state and an incoming vote, returns the state
/// the voter ends up in:
///
/// | current  | vote = Like | vote = Dislike |
/// |----------|-------------|----------------|
/// | None     | Liked       | Disliked       |
/// | Liked    | None        | Disliked       |
/// | Disliked | Liked       | None           |
#[must_use]
pub fn transition(current: Option<ReactionKind>, vote: ReactionKind) -> Option<ReactionKind> {
    match current {
        Some(existing) if existing == vote => None,
        _ => Some(vote),
    }
}

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reaction by user and post.
    pub async fn find_by_user_and_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The voter's current state for a post; `None` is neutral.
    pub async fn find_kind(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<ReactionKind>> {
        Ok(self
            .find_by_user_and_post(user_id, post_id)
            .await?
            .map(|r| r.kind))
    }

    /// Count reactions of one kind on a post.
    pub async fn count_by_post_and_kind(
        &self,
        post_id: &str,
        kind: ReactionKind,
    ) -> AppResult<u64> {
        Reaction::find()
            .filter(reaction::Column::PostId.eq(post_id))
            .filter(reaction::Column::Kind.eq(kind))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply one vote to the `(user, post)` pair and refresh the post's
    /// denormalized counts.
    ///
    /// The row mutation and both recounts run in a single transaction, so
    /// the counts on the post row can never drift from the reaction rows.
    /// `new_id` is used only if the transition inserts a row.
    pub async fn toggle(
        &self,
        user_id: &str,
        post_id: &str,
        vote: ReactionKind,
        new_id: &str,
    ) -> AppResult<ReactionTally> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_toggle(user_id, post_id, vote, new_id).await {
                Err(AppError::Conflict(reason)) if attempts < MAX_TOGGLE_ATTEMPTS => {
                    tracing::debug!(
                        user_id = %user_id,
                        post_id = %post_id,
                        attempt = attempts,
                        reason = %reason,
                        "Reaction toggle raced, retrying"
                    );
                }
                result => return result,
            }
        }
    }

    async fn try_toggle(
        &self,
        user_id: &str,
        post_id: &str,
        vote: ReactionKind,
        new_id: &str,
    ) -> AppResult<ReactionTally> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let current = Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::PostId.eq(post_id))
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let state = transition(current.as_ref().map(|r| r.kind), vote);

        match (current, state) {
            (Some(existing), None) => {
                // Same vote again: toggle off.
                existing
                    .delete(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            (Some(existing), Some(kind)) => {
                // Opposite vote: switch in place.
                let mut active: reaction::ActiveModel = existing.into();
                active.kind = Set(kind);
                active
                    .update(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            (None, Some(kind)) => {
                // First vote: insert. A concurrent vote by the same user can
                // win the (user_id, post_id) unique index; the loser reports
                // Conflict and the caller retries the read-modify-write.
                let model = reaction::ActiveModel {
                    id: Set(new_id.to_string()),
                    user_id: Set(user_id.to_string()),
                    post_id: Set(post_id.to_string()),
                    kind: Set(kind),
                    created_at: Set(chrono::Utc::now().into()),
                };
                if let Err(e) = model.insert(&txn).await {
                    txn.rollback().await.ok();
                    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                        return Err(AppError::Conflict(
                            "Concurrent reaction on the same post".to_string(),
                        ));
                    }
                    return Err(AppError::Database(e.to_string()));
                }
            }
            (None, None) => {}
        }

        let like_count = Self::count_in_txn(&txn, post_id, ReactionKind::Like).await?;
        let dislike_count = Self::count_in_txn(&txn, post_id, ReactionKind::Dislike).await?;

        let post = Post::find_by_id(post_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;

        let mut active: post::ActiveModel = post.into();
        active.like_count = Set(like_count);
        active.dislike_count = Set(dislike_count);
        active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ReactionTally {
            like_count,
            dislike_count,
            state,
        })
    }

    async fn count_in_txn(
        txn: &sea_orm::DatabaseTransaction,
        post_id: &str,
        kind: ReactionKind,
    ) -> AppResult<i32> {
        let count = Reaction::find()
            .filter(reaction::Column::PostId.eq(post_id))
            .filter(reaction::Column::Kind.eq(kind))
            .count(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count as i32)
    }
}
