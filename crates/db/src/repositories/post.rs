//! Post repository.
//!
//! Every listing uses the feed order: newest `created` first, and for equal
//! timestamps the lower id (earlier insert) first.

use std::sync::Arc;

use crate::entities::{Post, post};
use crate::repositories::write_error;
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};

/// Which posts a listing selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts filed under one group.
    Group(i32),
    /// Posts by one author.
    Author(i32),
    /// Posts by any of several authors.
    Authors(Vec<i32>),
}

impl PostFilter {
    fn condition(&self) -> Condition {
        match self {
            Self::All => Condition::all(),
            Self::Group(group_id) => Condition::all().add(post::Column::GroupId.eq(*group_id)),
            Self::Author(author_id) => {
                Condition::all().add(post::Column::AuthorId.eq(*author_id))
            }
            Self::Authors(author_ids) => {
                Condition::all().add(post::Column::AuthorId.is_in(author_ids.iter().copied()))
            }
        }
    }

    fn select(&self) -> Select<Post> {
        Post::find().filter(self.condition())
    }
}

fn window_query(filter: &PostFilter, offset: u64, limit: u64) -> Select<Post> {
    filter
        .select()
        .order_by_desc(post::Column::Created)
        .order_by_asc(post::Column::Id)
        .offset(offset)
        .limit(limit)
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::PostNotFound(id))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.insert(self.db.as_ref()).await.map_err(write_error)
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.update(self.db.as_ref()).await.map_err(write_error)
    }

    /// Delete a post (its comments go with it). Returns whether a row was removed.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count the posts a filter selects.
    pub async fn count(&self, filter: &PostFilter) -> AppResult<u64> {
        filter
            .select()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch one window of the posts a filter selects, in feed order.
    pub async fn find_window(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        window_query(filter, offset, limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the posts written by one author.
    pub async fn count_by_author(&self, author_id: i32) -> AppResult<u64> {
        self.count(&PostFilter::Author(author_id)).await
    }
}
