//! Reaction service.

use snapfeed_common::{AppError, AppResult, IdGenerator};
use snapfeed_db::repositories::{PostRepository, ReactionRepository, ReactionTally};
use snapfeed_db::entities::reaction::ReactionKind;

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    reaction_repo: ReactionRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(reaction_repo: ReactionRepository, post_repo: PostRepository) -> Self {
        Self {
            reaction_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Apply one like/dislike vote to a post.
    ///
    /// `kind` must be `"like"` or `"dislike"`. Returns the refreshed counts
    /// together with the voter's resulting state.
    pub async fn react(
        &self,
        user_id: &str,
        post_id: &str,
        kind: &str,
    ) -> AppResult<ReactionTally> {
        let vote = ReactionKind::parse(kind)
            .ok_or_else(|| AppError::InvalidArgument(format!("Unknown reaction kind {kind:?}")))?;

        // Check the post exists before mutating anything.
        self.post_repo.get_by_id(post_id).await?;

        let tally = self
            .reaction_repo
            .toggle(user_id, post_id, vote, &self.id_gen.generate())
            .await?;

        tracing::debug!(
            user_id = %user_id,
            post_id = %post_id,
            kind = %vote.as_str(),
            like_count = tally.like_count,
            dislike_count = tally.dislike_count,
            "Applied reaction"
        );

        Ok(tally)
    }

    /// The acting user's current reaction state on a post; `None` is neutral.
    pub async fn current(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<ReactionKind>> {
        self.post_repo.get_by_id(post_id).await?;
        self.reaction_repo.find_kind(user_id, post_id).await
    }
}
