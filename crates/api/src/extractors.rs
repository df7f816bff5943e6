//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use quill_core::Viewer;
use quill_db::entities::user;

/// Where anonymous callers are sent to sign in.
pub const LOGIN_PATH: &str = "/auth/login/";

/// Redirect to the login page, remembering where the caller was going.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    next: String,
}

impl LoginRedirect {
    #[must_use]
    pub fn new(uri: &Uri) -> Self {
        let next = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string);
        Self { next }
    }

    /// The `Location` this redirect points at.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{LOGIN_PATH}?next={}", urlencoding::encode(&self.next))
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        tracing::debug!(next = %self.next, "Redirecting anonymous caller to login");
        Redirect::to(&self.location()).into_response()
    }
}

/// Authenticated user extractor. Anonymous callers are redirected to login.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| LoginRedirect::new(&parts.uri))
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl MaybeAuthUser {
    #[must_use]
    pub fn viewer(self) -> Viewer {
        Viewer::from(self.0)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}
