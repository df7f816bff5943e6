//! HTTP layer for quill.
//!
//! - **Endpoints**: feeds, posts, comments, follows, groups and auth
//! - **Extractors**: bearer-token user, login redirect for anonymous callers
//! - **Middleware**: token authentication and shared service state

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use extractors::{AuthUser, LOGIN_PATH, LoginRedirect, MaybeAuthUser};
pub use middleware::{AppState, auth_middleware};
