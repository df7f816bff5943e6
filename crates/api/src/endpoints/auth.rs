//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use quill_common::{AppError, AppResult};
use quill_core::CreateUserInput;
use quill_db::entities::user;
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Credentials handed back after signup or login.
#[derive(Serialize)]
pub struct TokenResponse {
    pub id: i32,
    pub username: String,
    pub token: String,
}

impl TryFrom<user::Model> for TokenResponse {
    type Error = AppError;

    fn try_from(user: user::Model) -> AppResult<Self> {
        let token = user
            .token
            .ok_or_else(|| AppError::Internal(format!("user {} has no token", user.id)))?;
        Ok(Self {
            id: user.id,
            username: user.username,
            token,
        })
    }
}

/// Create a new user account.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let user = state
        .user_service
        .create(CreateUserInput {
            username: req.username,
            password: req.password,
            name: req.name,
        })
        .await?;

    Ok(ApiResponse::ok(TokenResponse::try_from(user)?))
}

/// Exchange a username and password for the account's token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let user = state
        .user_service
        .authenticate(&req.username, &req.password)
        .await?;

    tracing::debug!(user_id = user.id, "User logged in");
    Ok(ApiResponse::ok(TokenResponse::try_from(user)?))
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    next: Option<String>,
}

/// Where a client should return to after logging in.
#[derive(Serialize)]
struct LoginHint {
    next: String,
}

/// Target of the login redirect; echoes `next` back for the client.
async fn login_hint(Query(query): Query<LoginQuery>) -> ApiResponse<LoginHint> {
    ApiResponse::ok(LoginHint {
        next: query.next.unwrap_or_else(|| "/".to_string()),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/", post(signup))
        .route("/login/", get(login_hint).post(login))
}
