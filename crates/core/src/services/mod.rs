//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod feed;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::{CommentInput, CommentService};
pub use feed::{Feed, FeedScope, FeedService, FeedSubject, Viewer};
pub use follow::{FollowResult, FollowService};
pub use group::{CreateGroupInput, GroupService};
pub use post::{CommentWithAuthor, ImageUpload, PostDetail, PostInput, PostService, PostWithAuthor};
pub use user::{CreateUserInput, UserService};
