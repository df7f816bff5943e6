//! Follow repository.
//!
//! The `(user_id, author_id)` unique index is what keeps edges unique;
//! inserts never check-then-insert.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use crate::repositories::write_error;
use chrono::Utc;
use quill_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the edge for a pair.
    pub async fn find_by_pair(
        &self,
        user_id: i32,
        author_id: i32,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if `user_id` follows `author_id`.
    pub async fn exists(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, author_id).await?.is_some())
    }

    /// Insert the edge unless it already exists. Returns whether a row was added.
    pub async fn insert_if_absent(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        let model = follow::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let rows = Follow::insert(model)
            .on_conflict(
                OnConflict::columns([follow::Column::UserId, follow::Column::AuthorId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(write_error)?;

        Ok(rows > 0)
    }

    /// Delete the edge for a pair. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        let result = Follow::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// IDs of every author `user_id` follows.
    pub async fn find_author_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        Follow::find()
            .select_only()
            .column(follow::Column::AuthorId)
            .filter(follow::Column::UserId.eq(user_id))
            .order_by_asc(follow::Column::AuthorId)
            .into_tuple::<i32>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users following `author_id`.
    pub async fn count_followers(&self, author_id: i32) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count authors `user_id` follows.
    pub async fn count_following(&self, user_id: i32) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
