//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use quill_common::StorageBackend;
use quill_core::{
    CommentService, FeedService, FollowService, GroupService, PostService, UserService,
};
use quill_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub feed_service: FeedService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: &Arc<DatabaseConnection>, storage: Arc<dyn StorageBackend>) -> Self {
        let user_repo = UserRepository::new(Arc::clone(db));
        let group_repo = GroupRepository::new(Arc::clone(db));
        let post_repo = PostRepository::new(Arc::clone(db));
        let comment_repo = CommentRepository::new(Arc::clone(db));
        let follow_repo = FollowRepository::new(Arc::clone(db));

        let post_service = PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo.clone(),
            comment_repo.clone(),
            storage,
        );

        Self {
            user_service: UserService::new(user_repo.clone()),
            group_service: GroupService::new(group_repo.clone()),
            comment_service: CommentService::new(comment_repo, post_repo.clone()),
            follow_service: FollowService::new(follow_repo.clone(), user_repo.clone()),
            feed_service: FeedService::new(
                post_repo,
                user_repo,
                group_repo,
                follow_repo,
                post_service.clone(),
            ),
            post_service,
        }
    }
}

/// Authentication middleware.
///
/// A valid `Authorization: Bearer <token>` puts the user into the request
/// extensions; anything else leaves the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Token lookup failed");
            }
            Err(_) => tracing::debug!("Ignoring unknown bearer token"),
        }
    }

    next.run(req).await
}
