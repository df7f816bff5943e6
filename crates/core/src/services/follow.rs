//! Follow graph: directed user -> author subscriptions.
//!
//! Both `follow` and `unfollow` are idempotent. Following yourself is
//! silently ignored here, and the `follow` table rejects it as well.

use quill_common::AppResult;
use quill_db::{
    entities::user,
    repositories::{FollowRepository, UserRepository},
};
use serde::Serialize;

/// Outcome of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowResult {
    /// A new edge was created.
    Following,
    /// The edge already existed; nothing changed.
    AlreadyFollowing,
    /// The user asked to follow themselves; nothing changed.
    SelfFollowIgnored,
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
        }
    }

    /// Make `user_id` follow `author_id`.
    pub async fn follow(&self, user_id: i32, author_id: i32) -> AppResult<FollowResult> {
        if user_id == author_id {
            tracing::debug!(user_id, "Ignoring self-follow");
            return Ok(FollowResult::SelfFollowIgnored);
        }

        // Resolve the author so a dangling id surfaces as not found.
        self.user_repo.get_by_id(author_id).await?;

        if self.follow_repo.insert_if_absent(user_id, author_id).await? {
            tracing::debug!(user_id, author_id, "Followed");
            Ok(FollowResult::Following)
        } else {
            Ok(FollowResult::AlreadyFollowing)
        }
    }

    /// Remove the edge if present. Returns whether an edge was removed.
    pub async fn unfollow(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        let removed = self.follow_repo.delete_by_pair(user_id, author_id).await?;
        if removed {
            tracing::debug!(user_id, author_id, "Unfollowed");
        }
        Ok(removed)
    }

    /// Follow the author with `username`.
    pub async fn follow_by_username(
        &self,
        user_id: i32,
        username: &str,
    ) -> AppResult<(user::Model, FollowResult)> {
        let author = self.user_repo.get_by_username(username).await?;
        let result = self.follow(user_id, author.id).await?;
        Ok((author, result))
    }

    /// Unfollow the author with `username`.
    pub async fn unfollow_by_username(
        &self,
        user_id: i32,
        username: &str,
    ) -> AppResult<(user::Model, bool)> {
        let author = self.user_repo.get_by_username(username).await?;
        let removed = self.unfollow(user_id, author.id).await?;
        Ok((author, removed))
    }

    /// Check if `user_id` follows `author_id`.
    pub async fn is_following(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        self.follow_repo.exists(user_id, author_id).await
    }

    /// IDs of the authors `user_id` follows.
    pub async fn followed_author_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        self.follow_repo.find_author_ids(user_id).await
    }

    /// The authors `user_id` follows, by username.
    pub async fn followed_authors(&self, user_id: i32) -> AppResult<Vec<user::Model>> {
        let ids = self.followed_author_ids(user_id).await?;
        self.user_repo.find_by_ids(&ids).await
    }

    /// Number of users following `author_id`.
    pub async fn follower_count(&self, author_id: i32) -> AppResult<u64> {
        self.follow_repo.count_followers(author_id).await
    }

    /// Number of authors `user_id` follows.
    pub async fn following_count(&self, user_id: i32) -> AppResult<u64> {
        self.follow_repo.count_following(user_id).await
    }
}
