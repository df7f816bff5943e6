//! HTTP endpoints.

mod auth;
mod feed;
mod follow;
mod groups;
mod posts;

use axum::Router;

use crate::middleware::AppState;

pub use feed::PageQuery;

/// Create the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(feed::router())
        .merge(posts::router())
        .merge(follow::router())
        .merge(groups::router())
        .nest("/auth", auth::router())
}
