//! Feed endpoints: index, group, profile and following.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use quill_common::AppResult;
use quill_core::{Feed, FeedScope, Viewer, parse_page_number};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// `?page=` as sent by the client; anything unparsable means page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    fn number(&self) -> i64 {
        parse_page_number(self.page.as_deref())
    }
}

async fn index(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Feed>> {
    let feed = state
        .feed_service
        .assemble(&viewer.viewer(), FeedScope::All, query.number())
        .await?;
    Ok(ApiResponse::ok(feed))
}

async fn group_posts(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Feed>> {
    let feed = state
        .feed_service
        .assemble(&viewer.viewer(), FeedScope::Group(slug), query.number())
        .await?;
    Ok(ApiResponse::ok(feed))
}

async fn profile(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Feed>> {
    let feed = state
        .feed_service
        .assemble(&viewer.viewer(), FeedScope::Profile(username), query.number())
        .await?;
    Ok(ApiResponse::ok(feed))
}

/// Posts by followed authors. Anonymous callers never get here.
async fn follow_index(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Feed>> {
    let feed = state
        .feed_service
        .assemble(&Viewer::User(user), FeedScope::Following, query.number())
        .await?;
    Ok(ApiResponse::ok(feed))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/follow/", get(follow_index))
}
