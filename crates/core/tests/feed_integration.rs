//! Feed and follow-graph behaviour against a migrated SQLite database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use quill_common::{AppError, InMemoryStorage};
use quill_core::{
    CommentInput, CommentService, FeedScope, FeedService, FeedSubject, FollowResult,
    FollowService, ImageUpload, PostInput, PostService, Viewer,
};
use quill_db::{
    entities::user,
    repositories::{
        CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
    },
    test_utils::{TestDatabase, at, seed_group, seed_post, seed_user},
};

struct Harness {
    db: TestDatabase,
    storage: Arc<InMemoryStorage>,
    posts: PostService,
    comments: CommentService,
    follows: FollowService,
    feeds: FeedService,
}

impl Harness {
    async fn new() -> Self {
        let db = TestDatabase::in_memory().await.expect("database");
        let storage = Arc::new(InMemoryStorage::new());

        let user_repo = UserRepository::new(db.shared());
        let group_repo = GroupRepository::new(db.shared());
        let post_repo = PostRepository::new(db.shared());
        let comment_repo = CommentRepository::new(db.shared());
        let follow_repo = FollowRepository::new(db.shared());

        let posts = PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo.clone(),
            comment_repo.clone(),
            storage.clone(),
        );
        let comments = CommentService::new(comment_repo, post_repo.clone());
        let follows = FollowService::new(follow_repo.clone(), user_repo.clone());
        let feeds = FeedService::new(post_repo, user_repo, group_repo, follow_repo, posts.clone());

        Self {
            db,
            storage,
            posts,
            comments,
            follows,
            feeds,
        }
    }

    async fn user(&self, username: &str) -> user::Model {
        seed_user(self.db.connection(), username).await.unwrap()
    }

    async fn feed(&self, viewer: &user::Model, scope: FeedScope, page: i64) -> Vec<String> {
        self.feeds
            .assemble(&Viewer::User(viewer.clone()), scope, page)
            .await
            .unwrap()
            .page
            .items
            .into_iter()
            .map(|p| p.post.text)
            .collect()
    }
}

fn text(text: &str) -> PostInput {
    PostInput {
        text: text.to_string(),
        group_id: None,
        image: None,
    }
}

#[tokio::test]
async fn test_follow_is_idempotent() {
    let h = Harness::new().await;
    let reader = h.user("reader").await;
    let writer = h.user("writer").await;

    assert_eq!(
        h.follows.follow(reader.id, writer.id).await.unwrap(),
        FollowResult::Following
    );
    assert_eq!(
        h.follows.follow(reader.id, writer.id).await.unwrap(),
        FollowResult::AlreadyFollowing
    );
    assert_eq!(h.follows.follower_count(writer.id).await.unwrap(), 1);

    assert!(h.follows.unfollow(reader.id, writer.id).await.unwrap());
    assert!(!h.follows.unfollow(reader.id, writer.id).await.unwrap());
    assert_eq!(h.follows.follower_count(writer.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_self_follow_creates_no_edge() {
    let h = Harness::new().await;
    let narcissus = h.user("narcissus").await;

    assert_eq!(
        h.follows.follow(narcissus.id, narcissus.id).await.unwrap(),
        FollowResult::SelfFollowIgnored
    );
    assert!(!h.follows.is_following(narcissus.id, narcissus.id).await.unwrap());
}

#[tokio::test]
async fn test_following_feed_tracks_follow_graph() {
    let h = Harness::new().await;
    let reader = h.user("reader").await;
    let writer = h.user("writer").await;
    let stranger = h.user("stranger").await;

    // Posts written before the follow still show up.
    seed_post(h.db.connection(), &writer, None, "early", at(1)).await.unwrap();
    seed_post(h.db.connection(), &stranger, None, "noise", at(2)).await.unwrap();

    assert!(h.feed(&reader, FeedScope::Following, 1).await.is_empty());

    h.follows.follow(reader.id, writer.id).await.unwrap();
    h.posts.create(writer.id, text("fresh")).await.unwrap();

    assert_eq!(
        h.feed(&reader, FeedScope::Following, 1).await,
        vec!["fresh", "early"]
    );
    // The writer does not see their own posts in their following feed.
    assert!(h.feed(&writer, FeedScope::Following, 1).await.is_empty());

    h.follows.unfollow(reader.id, writer.id).await.unwrap();
    assert!(h.feed(&reader, FeedScope::Following, 1).await.is_empty());
}

#[tokio::test]
async fn test_following_feed_rejects_anonymous_viewer() {
    let h = Harness::new().await;

    let result = h
        .feeds
        .assemble(&Viewer::Anonymous, FeedScope::Following, 1)
        .await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_pages_clamp_to_last_page_in_every_scope() {
    let h = Harness::new().await;
    let writer = h.user("writer").await;
    let cats = seed_group(h.db.connection(), "cats").await.unwrap();

    for i in 0..13 {
        seed_post(
            h.db.connection(),
            &writer,
            Some(&cats),
            &format!("post {i}"),
            at(i),
        )
        .await
        .unwrap();
    }

    for scope in [
        FeedScope::All,
        FeedScope::Group("cats".to_string()),
        FeedScope::Profile("writer".to_string()),
    ] {
        let first = h.feeds.assemble(&Viewer::Anonymous, scope.clone(), 1).await.unwrap();
        assert_eq!(first.page.items.len(), 10);
        assert_eq!(first.page.total_pages, 2);
        assert_eq!(first.page.items[0].post.text, "post 12");
        assert_eq!(first.page.items[0].author.username, "writer");
        assert_eq!(first.page.items[0].group.as_ref().unwrap().slug, "cats");

        let second = h.feeds.assemble(&Viewer::Anonymous, scope.clone(), 2).await.unwrap();
        assert_eq!(second.page.items.len(), 3);
        assert!(!second.page.has_next);

        let beyond = h.feeds.assemble(&Viewer::Anonymous, scope.clone(), 3).await.unwrap();
        assert_eq!(beyond.page.number, 2);
        assert_eq!(beyond.page.items, second.page.items);

        let below = h.feeds.assemble(&Viewer::Anonymous, scope, 0).await.unwrap();
        assert_eq!(below.page.number, 2);
    }
}

#[tokio::test]
async fn test_equal_timestamps_order_by_id() {
    let h = Harness::new().await;
    let writer = h.user("writer").await;

    for name in ["a", "b", "c"] {
        seed_post(h.db.connection(), &writer, None, name, at(5)).await.unwrap();
    }
    seed_post(h.db.connection(), &writer, None, "newest", at(6)).await.unwrap();

    let texts = h.feed(&writer, FeedScope::All, 1).await;
    assert_eq!(texts, vec!["newest", "a", "b", "c"]);
}

#[tokio::test]
async fn test_empty_feed_is_single_empty_page() {
    let h = Harness::new().await;

    let feed = h.feeds.assemble(&Viewer::Anonymous, FeedScope::All, 5).await.unwrap();

    assert!(feed.page.items.is_empty());
    assert_eq!(feed.page.number, 1);
    assert_eq!(feed.page.total_pages, 1);
}

#[tokio::test]
async fn test_unknown_group_and_profile_are_not_found() {
    let h = Harness::new().await;

    let group = h
        .feeds
        .assemble(&Viewer::Anonymous, FeedScope::Group("nope".into()), 1)
        .await;
    let profile = h
        .feeds
        .assemble(&Viewer::Anonymous, FeedScope::Profile("ghost".into()), 1)
        .await;

    assert!(matches!(group, Err(AppError::GroupNotFound(_))));
    assert!(matches!(profile, Err(AppError::UserNotFound(_))));
}

#[tokio::test]
async fn test_profile_reports_follow_state() {
    let h = Harness::new().await;
    let reader = h.user("reader").await;
    h.user("writer").await;
    h.follows.follow_by_username(reader.id, "writer").await.unwrap();

    let feed = h
        .feeds
        .assemble(
            &Viewer::User(reader),
            FeedScope::Profile("writer".into()),
            1,
        )
        .await
        .unwrap();

    assert!(matches!(
        feed.subject,
        FeedSubject::Author {
            is_following: true,
            ..
        }
    ));
}

#[tokio::test]
async fn test_only_author_can_edit() {
    let h = Harness::new().await;
    let author = h.user("author").await;
    let intruder = h.user("intruder").await;
    let post = h.posts.create(author.id, text("mine")).await.unwrap();

    let result = h.posts.update(intruder.id, post.id, text("hijacked")).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(h.posts.get(post.id).await.unwrap().text, "mine");

    let edited = h.posts.update(author.id, post.id, text("still mine")).await.unwrap();
    assert_eq!(edited.text, "still mine");
    assert_eq!(edited.created, post.created);
}

#[tokio::test]
async fn test_image_is_stored_under_posts_dir() {
    let h = Harness::new().await;
    let author = h.user("author").await;

    let mut input = text("with a picture");
    input.image = Some(ImageUpload {
        file_name: "../../small.gif".to_string(),
        content_type: "image/gif".to_string(),
        data: b"GIF89a".to_vec(),
    });
    let post = h.posts.create(author.id, input).await.unwrap();

    assert_eq!(post.image.as_deref(), Some("posts/small.gif"));
    assert_eq!(h.storage.get("posts/small.gif").await.unwrap(), b"GIF89a");

    // Editing without a new image keeps the old one.
    let edited = h.posts.update(author.id, post.id, text("caption")).await.unwrap();
    assert_eq!(edited.image.as_deref(), Some("posts/small.gif"));
}

#[tokio::test]
async fn test_detail_includes_comments_and_post_count() {
    let h = Harness::new().await;
    let author = h.user("author").await;
    let reader = h.user("reader").await;
    let post = h.posts.create(author.id, text("first")).await.unwrap();
    h.posts.create(author.id, text("second")).await.unwrap();

    h.comments
        .add(reader.id, post.id, CommentInput { text: "nice".into() })
        .await
        .unwrap();
    h.comments
        .add(author.id, post.id, CommentInput { text: "thanks".into() })
        .await
        .unwrap();

    let detail = h.posts.detail(post.id).await.unwrap();
    assert_eq!(detail.post.post.text, "first");
    assert_eq!(detail.author_posts_count, 2);
    let comments: Vec<_> = detail
        .comments
        .iter()
        .map(|c| (c.author.username.as_str(), c.comment.text.as_str()))
        .collect();
    assert_eq!(comments, vec![("reader", "nice"), ("author", "thanks")]);
}

#[tokio::test]
async fn test_deleting_post_removes_comments() {
    let h = Harness::new().await;
    let author = h.user("author").await;
    let post = h.posts.create(author.id, text("short-lived")).await.unwrap();
    h.comments
        .add(author.id, post.id, CommentInput { text: "bye".into() })
        .await
        .unwrap();

    h.posts.delete(author.id, post.id).await.unwrap();

    assert!(h.comments.list(post.id).await.unwrap().is_empty());
    assert!(matches!(
        h.posts.get(post.id).await,
        Err(AppError::PostNotFound(_))
    ));
}

#[tokio::test]
async fn test_followed_authors_by_username() {
    let h = Harness::new().await;
    let reader = h.user("reader").await;
    let zoe = h.user("zoe").await;
    let adam = h.user("adam").await;

    h.follows.follow(reader.id, zoe.id).await.unwrap();
    h.follows.follow(reader.id, adam.id).await.unwrap();

    let names: Vec<String> = h
        .follows
        .followed_authors(reader.id)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(names, vec!["adam", "zoe"]);
    assert_eq!(h.follows.following_count(reader.id).await.unwrap(), 2);

    h.follows.unfollow(reader.id, zoe.id).await.unwrap();
    h.follows.unfollow(reader.id, adam.id).await.unwrap();

    assert!(h.follows.followed_authors(reader.id).await.unwrap().is_empty());
    assert_eq!(h.follows.following_count(reader.id).await.unwrap(), 0);
}

fn with_image(body: &str, file_name: &str, data: &[u8]) -> PostInput {
    let mut input = text(body);
    input.image = Some(ImageUpload {
        file_name: file_name.to_string(),
        content_type: "image/gif".to_string(),
        data: data.to_vec(),
    });
    input
}

#[tokio::test]
async fn test_same_file_name_from_two_authors_keeps_both_images() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let mallory = h.user("mallory").await;

    let first = h
        .posts
        .create(alice.id, with_image("mine", "photo.gif", b"ALICE"))
        .await
        .unwrap();
    let second = h
        .posts
        .create(mallory.id, with_image("also mine", "photo.gif", b"MALLORY"))
        .await
        .unwrap();

    let first_key = first.image.unwrap();
    let second_key = second.image.unwrap();
    assert_eq!(first_key, "posts/photo.gif");
    assert_ne!(first_key, second_key);
    assert!(second_key.starts_with("posts/photo_"));
    assert_eq!(h.storage.get(&first_key).await.unwrap(), b"ALICE");
    assert_eq!(h.storage.get(&second_key).await.unwrap(), b"MALLORY");

    h.posts.delete(mallory.id, second.id).await.unwrap();

    assert_eq!(h.storage.get(&first_key).await.unwrap(), b"ALICE");
    assert!(h.storage.get(&second_key).await.is_none());
}

#[tokio::test]
async fn test_replacing_image_removes_old_file() {
    let h = Harness::new().await;
    let author = h.user("author").await;

    let post = h
        .posts
        .create(author.id, with_image("v1", "old.gif", b"OLD"))
        .await
        .unwrap();
    let edited = h
        .posts
        .update(author.id, post.id, with_image("v2", "new.gif", b"NEW"))
        .await
        .unwrap();

    assert_eq!(edited.image.as_deref(), Some("posts/new.gif"));
    assert_eq!(h.storage.get("posts/new.gif").await.unwrap(), b"NEW");
    assert!(h.storage.get("posts/old.gif").await.is_none());
}

#[tokio::test]
async fn test_reuploading_same_name_on_edit_keeps_new_image() {
    let h = Harness::new().await;
    let author = h.user("author").await;

    let post = h
        .posts
        .create(author.id, with_image("v1", "cat.gif", b"ONE"))
        .await
        .unwrap();
    let edited = h
        .posts
        .update(author.id, post.id, with_image("v2", "cat.gif", b"TWO"))
        .await
        .unwrap();

    let key = edited.image.unwrap();
    assert_ne!(key, "posts/cat.gif");
    assert_eq!(h.storage.get(&key).await.unwrap(), b"TWO");
    assert!(h.storage.get("posts/cat.gif").await.is_none());
}
