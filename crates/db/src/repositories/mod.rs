//! Repositories: one struct per entity, wrapping a shared connection.

mod comment;
mod follow;
mod group;
mod post;
mod user;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use group::GroupRepository;
pub use post::{PostFilter, PostRepository};
pub use user::UserRepository;

use quill_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Translate a write error, reporting constraint violations as validation
/// failures instead of infrastructure faults.
pub(crate) fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            AppError::Validation(format!("already exists: {detail}"))
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            AppError::Validation(format!("references a missing row: {detail}"))
        }
        _ => AppError::Database(err.to_string()),
    }
}
