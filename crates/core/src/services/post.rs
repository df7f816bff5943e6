//! Post service.
//!
//! Only the author may change or delete a post. The ownership check runs
//! before any input validation or storage write.

use std::collections::HashMap;
use std::sync::Arc;

use quill_common::{AppError, AppResult, POST_IMAGE_DIR, StorageBackend, available_key};
use quill_db::{
    entities::{comment, group, post, user},
    repositories::{CommentRepository, GroupRepository, PostRepository, UserRepository},
};
use sea_orm::Set;
use serde::Serialize;
use validator::{Validate, ValidationError};

/// Reject text that is empty once surrounding whitespace is removed.
pub(crate) fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

/// An image uploaded with a post.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client supplied file name; only its last path component is kept, with
    /// a random suffix when another post already uses it.
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Fields of the create and edit forms.
#[derive(Debug, Clone, Validate)]
pub struct PostInput {
    #[validate(custom(function = "not_blank"))]
    pub text: String,

    /// Group to file the post under; `None` leaves it ungrouped.
    pub group_id: Option<i32>,

    /// New image; on edit `None` keeps the current one.
    pub image: Option<ImageUpload>,
}

/// A post together with the rows needed to display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: post::Model,
    pub author: user::Model,
    pub group: Option<group::Model>,
}

/// A comment with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub author: user::Model,
}

/// Everything the post detail page shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub post: PostWithAuthor,
    pub comments: Vec<CommentWithAuthor>,
    /// Number of posts by the same author.
    pub author_posts_count: u64,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    comment_repo: CommentRepository,
    storage: Arc<dyn StorageBackend>,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        comment_repo: CommentRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            comment_repo,
            storage,
        }
    }

    /// Publish a new post by `author_id`.
    pub async fn create(&self, author_id: i32, input: PostInput) -> AppResult<post::Model> {
        input.validate()?;
        self.check_group(input.group_id).await?;

        let image = match &input.image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => None,
        };

        let model = post::ActiveModel {
            text: Set(input.text),
            created: Set(chrono::Utc::now().into()),
            author_id: Set(author_id),
            group_id: Set(input.group_id),
            image: Set(image),
            ..Default::default()
        };

        let post = self.post_repo.create(model).await?;
        tracing::debug!(post_id = post.id, author_id, "Post created");
        Ok(post)
    }

    /// Edit a post. Fails with `Forbidden` unless `actor_id` wrote it.
    pub async fn update(
        &self,
        actor_id: i32,
        post_id: i32,
        input: PostInput,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        ensure_author(&post, actor_id)?;

        input.validate()?;
        self.check_group(input.group_id).await?;

        let previous_image = post.image.clone();
        let image = match &input.image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => previous_image.clone(),
        };

        let mut active: post::ActiveModel = post.into();
        active.text = Set(input.text);
        active.group_id = Set(input.group_id);
        active.image = Set(image);

        let post = self.post_repo.update(active).await?;

        if let Some(old) = previous_image.as_deref()
            && post.image.as_deref() != Some(old)
        {
            self.remove_image(old).await;
        }

        tracing::debug!(post_id = post.id, "Post edited");
        Ok(post)
    }

    /// Delete a post and its comments. Fails with `Forbidden` unless `actor_id` wrote it.
    pub async fn delete(&self, actor_id: i32, post_id: i32) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        ensure_author(&post, actor_id)?;

        self.post_repo.delete(post.id).await?;

        if let Some(key) = post.image.as_deref() {
            self.remove_image(key).await;
        }

        tracing::debug!(post_id, "Post deleted");
        Ok(())
    }

    /// Get a post by ID.
    pub async fn get(&self, post_id: i32) -> AppResult<post::Model> {
        self.post_repo.get_by_id(post_id).await
    }

    /// The post, its comments oldest first, and its author's post count.
    pub async fn detail(&self, post_id: i32) -> AppResult<PostDetail> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let author_posts_count = self.post_repo.count_by_author(post.author_id).await?;

        let comments = self.comment_repo.find_by_post(post.id).await?;
        let author_ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
        let authors = self.users_by_id(&author_ids).await?;
        let comments = comments
            .into_iter()
            .filter_map(|comment| {
                let author = authors.get(&comment.author_id)?.clone();
                Some(CommentWithAuthor { comment, author })
            })
            .collect();

        let post = self
            .with_authors(vec![post])
            .await?
            .pop()
            .ok_or(AppError::PostNotFound(post_id))?;

        Ok(PostDetail {
            post,
            comments,
            author_posts_count,
        })
    }

    /// Attach author and group rows to posts, keeping their order.
    pub async fn with_authors(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostWithAuthor>> {
        let author_ids: Vec<i32> = posts.iter().map(|p| p.author_id).collect();
        let group_ids: Vec<i32> = posts.iter().filter_map(|p| p.group_id).collect();

        let authors = self.users_by_id(&author_ids).await?;
        let groups: HashMap<i32, group::Model> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let author = authors
                    .get(&post.author_id)
                    .cloned()
                    .ok_or_else(|| AppError::UserNotFound(post.author_id.to_string()))?;
                let group = post.group_id.and_then(|id| groups.get(&id).cloned());
                Ok(PostWithAuthor {
                    post,
                    author,
                    group,
                })
            })
            .collect()
    }

    async fn users_by_id(&self, ids: &[i32]) -> AppResult<HashMap<i32, user::Model>> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        Ok(self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect())
    }

    async fn check_group(&self, group_id: Option<i32>) -> AppResult<()> {
        if let Some(id) = group_id
            && self.group_repo.find_by_id(id).await?.is_none()
        {
            return Err(AppError::Validation(
                "group: Select a valid choice. That choice is not one of the available choices."
                    .to_string(),
            ));
        }
        Ok(())
    }

    async fn remove_image(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(error = %e, key, "Failed to delete post image");
        }
    }

    async fn store_image(&self, upload: &ImageUpload) -> AppResult<String> {
        let key = available_key(self.storage.as_ref(), POST_IMAGE_DIR, &upload.file_name).await?;
        let stored = self
            .storage
            .put(&key, &upload.data, &upload.content_type)
            .await?;
        Ok(stored.key)
    }
}

fn ensure_author(post: &post::Model, actor_id: i32) -> AppResult<()> {
    if post.author_id == actor_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "only the author can change this post".to_string(),
        ))
    }
}
