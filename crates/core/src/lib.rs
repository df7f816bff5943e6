//! Core business logic for quill: posts, comments, the follow graph and feeds.

pub mod pagination;
pub mod services;

pub use pagination::{POSTS_PER_PAGE, Page, PageWindow, paginate, parse_page_number};
pub use services::*;
