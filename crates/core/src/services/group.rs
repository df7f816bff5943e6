//! Group service.
//!
//! Groups are seeded out-of-band; the HTTP surface only reads them.

use std::sync::LazyLock;

use quill_common::AppResult;
use quill_db::{entities::group, repositories::GroupRepository};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap()
});

/// Group service for business logic.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
}

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 50), regex(path = *SLUG_RE))]
    pub slug: String,

    #[serde(default)]
    pub description: String,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(group_repo: GroupRepository) -> Self {
        Self { group_repo }
    }

    /// Create a group. The slug must be URL-safe and unused.
    pub async fn create(&self, input: CreateGroupInput) -> AppResult<group::Model> {
        input.validate()?;

        let model = group::ActiveModel {
            title: Set(input.title),
            slug: Set(input.slug),
            description: Set(input.description),
            ..Default::default()
        };

        let group = self.group_repo.create(model).await?;
        tracing::info!(group_id = group.id, slug = %group.slug, "Group created");
        Ok(group)
    }

    /// Get a group by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<group::Model> {
        self.group_repo.get_by_slug(slug).await
    }

    /// List all groups.
    pub async fn list(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.list().await
    }
}
