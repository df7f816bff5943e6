//! Comment service.

use quill_common::AppResult;
use quill_db::{
    entities::comment,
    repositories::{CommentRepository, PostRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::post::not_blank;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
}

/// Input for adding a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(custom(function = "not_blank"), length(max = 2000))]
    pub text: String,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
        }
    }

    /// Add a comment by `author_id` to an existing post.
    pub async fn add(
        &self,
        author_id: i32,
        post_id: i32,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        input.validate()?;

        let model = comment::ActiveModel {
            post_id: Set(post.id),
            author_id: Set(author_id),
            text: Set(input.text),
            created: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::debug!(comment_id = comment.id, post_id, author_id, "Comment added");
        Ok(comment)
    }

    /// Comments on a post, oldest first.
    pub async fn list(&self, post_id: i32) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_by_post(post_id).await
    }
}
