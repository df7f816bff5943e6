//! Post endpoints: create, edit, detail and comments.

use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::Redirect,
    routing::{get, post},
};
use quill_common::{AppError, AppResult};
use quill_core::{CommentInput, ImageUpload, PostDetail, PostInput};
use serde::Deserialize;
use tower_http::limit::RequestBodyLimitLayer;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Largest accepted create/edit form, image included.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

fn invalid_group() -> AppError {
    AppError::Validation(
        "group: Select a valid choice. That choice is not one of the available choices."
            .to_string(),
    )
}

/// Empty means "no group".
fn parse_group(raw: &str) -> AppResult<Option<i32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| invalid_group())
}

/// Read the `text`, `group` and `image` fields of a post form.
async fn read_post_form(mut multipart: Multipart) -> AppResult<PostInput> {
    let mut text = String::new();
    let mut group_id = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "text" => {
                text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "group" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                group_id = parse_group(&raw)?;
            }
            "image" => {
                let file_name = field.file_name().map(ToString::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                // Browsers send an empty part when no file was chosen.
                let Some(file_name) = file_name.filter(|n| !n.is_empty()) else {
                    continue;
                };
                if data.is_empty() {
                    continue;
                }
                if !content_type.starts_with("image/") {
                    return Err(AppError::Validation(
                        "image: Upload a valid image.".to_string(),
                    ));
                }

                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(PostInput {
        text,
        group_id,
        image,
    })
}

/// Publish a post, then show the author's profile.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let input = read_post_form(multipart).await?;
    state.post_service.create(user.id, input).await?;

    Ok(Redirect::to(&format!(
        "/profile/{}/",
        urlencoding::encode(&user.username)
    )))
}

/// Edit a post, then show it.
async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    multipart: Multipart,
) -> AppResult<Redirect> {
    // Refuse non-authors before reading the upload.
    let post = state.post_service.get(post_id).await?;
    if post.author_id != user.id {
        return Err(AppError::Forbidden(
            "only the author can change this post".to_string(),
        ));
    }

    let input = read_post_form(multipart).await?;
    let post = state.post_service.update(user.id, post_id, input).await?;

    Ok(Redirect::to(&format!("/posts/{}/", post.id)))
}

async fn detail(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> AppResult<ApiResponse<PostDetail>> {
    Ok(ApiResponse::ok(state.post_service.detail(post_id).await?))
}

#[derive(Debug, Deserialize)]
struct CommentForm {
    #[serde(default)]
    text: String,
}

/// Add a comment, then show the post.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    state
        .comment_service
        .add(user.id, post_id, CommentInput { text: form.text })
        .await?;

    Ok(Redirect::to(&format!("/posts/{post_id}/")))
}

pub fn router() -> Router<AppState> {
    let uploads = Router::new()
        .route("/create/", post(create))
        .route("/posts/{id}/edit/", post(edit))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES));

    Router::new()
        .merge(uploads)
        .route("/posts/{id}/", get(detail))
        .route("/posts/{id}/comment/", post(add_comment))
}
