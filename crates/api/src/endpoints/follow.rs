//! Follow endpoints.
//!
//! Both actions are idempotent and send the caller back where they came from.

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, header},
    response::Redirect,
    routing::post,
};
use quill_common::AppResult;

use crate::{extractors::AuthUser, middleware::AppState};

/// The `Referer` if it is a local path, else the author's profile.
fn back_to(headers: &HeaderMap, username: &str) -> Redirect {
    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with('/') && !v.starts_with("//") && !v.starts_with("/\\"));

    match referer {
        Some(referer) => Redirect::to(referer),
        None => Redirect::to(&format!("/profile/{}/", urlencoding::encode(username))),
    }
}

async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    let (author, result) = state
        .follow_service
        .follow_by_username(user.id, &username)
        .await?;
    tracing::debug!(user_id = user.id, author_id = author.id, ?result, "Follow request");

    Ok(back_to(&headers, &author.username))
}

async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    let (author, _) = state
        .follow_service
        .unfollow_by_username(user.id, &username)
        .await?;

    Ok(back_to(&headers, &author.username))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{username}/follow/", post(follow))
        .route("/profile/{username}/unfollow/", post(unfollow))
}
