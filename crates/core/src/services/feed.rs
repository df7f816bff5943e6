//! Feed assembly.
//!
//! Every listing (index, group, profile, following) is the same query:
//! resolve the scope to a post filter, count it, clamp the requested page,
//! then fetch one window newest first.

use quill_common::{AppError, AppResult};
use quill_db::{
    entities::{group, user},
    repositories::{FollowRepository, GroupRepository, PostFilter, PostRepository, UserRepository},
};
use serde::Serialize;

use super::post::{PostService, PostWithAuthor};
use crate::pagination::{POSTS_PER_PAGE, Page, PageWindow};

/// Who is looking at a feed.
#[derive(Debug, Clone, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(user::Model),
}

impl Viewer {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&user::Model> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl From<Option<user::Model>> for Viewer {
    fn from(user: Option<user::Model>) -> Self {
        user.map_or(Self::Anonymous, Self::User)
    }
}

/// Which posts a feed shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// All posts.
    All,
    /// Posts in the group with this slug.
    Group(String),
    /// Posts by the user with this username.
    Profile(String),
    /// Posts by authors the viewer follows.
    Following,
}

/// What the feed is about, resolved from its scope.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedSubject {
    Everyone,
    Group {
        group: group::Model,
    },
    Author {
        author: user::Model,
        /// Whether the viewer follows this author.
        is_following: bool,
    },
    Following,
}

/// One page of a feed.
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub subject: FeedSubject,
    pub page: Page<PostWithAuthor>,
}

/// Feed service for business logic.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    follow_repo: FollowRepository,
    posts: PostService,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        follow_repo: FollowRepository,
        posts: PostService,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            follow_repo,
            posts,
        }
    }

    /// Build one page of the feed for `scope`.
    ///
    /// `page_number` is clamped: anything past the end, and anything below 1,
    /// yields the last page.
    pub async fn assemble(
        &self,
        viewer: &Viewer,
        scope: FeedScope,
        page_number: i64,
    ) -> AppResult<Feed> {
        let (subject, filter) = match scope {
            FeedScope::All => (FeedSubject::Everyone, PostFilter::All),
            FeedScope::Group(slug) => {
                let group = self.group_repo.get_by_slug(&slug).await?;
                let filter = PostFilter::Group(group.id);
                (FeedSubject::Group { group }, filter)
            }
            FeedScope::Profile(username) => {
                let author = self.user_repo.get_by_username(&username).await?;
                let is_following = match viewer.user() {
                    Some(user) if user.id != author.id => {
                        self.follow_repo.exists(user.id, author.id).await?
                    }
                    _ => false,
                };
                let filter = PostFilter::Author(author.id);
                (
                    FeedSubject::Author {
                        author,
                        is_following,
                    },
                    filter,
                )
            }
            FeedScope::Following => {
                let user = viewer.user().ok_or(AppError::Unauthorized)?;
                let author_ids = self.follow_repo.find_author_ids(user.id).await?;
                if author_ids.is_empty() {
                    return Ok(Feed {
                        subject: FeedSubject::Following,
                        page: Page::empty(),
                    });
                }
                (FeedSubject::Following, PostFilter::Authors(author_ids))
            }
        };

        let page = self.page(&filter, page_number).await?;
        Ok(Feed { subject, page })
    }

    async fn page(&self, filter: &PostFilter, page_number: i64) -> AppResult<Page<PostWithAuthor>> {
        let total = self.post_repo.count(filter).await?;
        let window = PageWindow::new(total, POSTS_PER_PAGE, page_number);

        let posts = if total == 0 {
            Vec::new()
        } else {
            self.post_repo
                .find_window(filter, window.offset(), window.limit())
                .await?
        };

        let items = self.posts.with_authors(posts).await?;
        Ok(Page::from_window(window, items))
    }
}
