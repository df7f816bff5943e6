//! Test utilities for database operations.
//!
//! [`TestDatabase::in_memory`] gives each test its own migrated SQLite
//! database, so constraints, cascades and ordering run against a real engine.
//! The `seed_*` helpers insert rows directly, bypassing service rules.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use tracing::debug;

use crate::entities::{group, post, user};

/// A migrated database owned by one test.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory SQLite database with all migrations applied.
    pub async fn in_memory() -> Result<Self, DbErr> {
        // Every pooled connection would open its own empty in-memory
        // database, so the pool is pinned to a single connection.
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        Self::connect(opt).await
    }

    /// Connect to an arbitrary database (e.g. `TEST_DATABASE_URL`) and migrate it.
    pub async fn connect(opt: ConnectOptions) -> Result<Self, DbErr> {
        use sea_orm_migration::MigratorTrait;

        let conn = Database::connect(opt).await?;
        crate::migrations::Migrator::up(&conn, None).await?;

        debug!("Test database ready");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.conn.as_ref()
    }

    /// Shared handle for repositories.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }
}

/// Fixed timestamp `seconds` after 2024-01-01T00:00:00Z.
#[must_use]
pub fn at(seconds: i64) -> DateTime<FixedOffset> {
    DateTime::<Utc>::from_timestamp(1_704_067_200 + seconds, 0)
        .unwrap_or_default()
        .fixed_offset()
}

/// Insert a user with token `token-<username>`.
pub async fn seed_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
    user::ActiveModel {
        username: Set(username.to_string()),
        name: Set(None),
        password_hash: Set(None),
        token: Set(Some(format!("token-{username}"))),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a group.
pub async fn seed_group(db: &DatabaseConnection, slug: &str) -> Result<group::Model, DbErr> {
    group::ActiveModel {
        title: Set(format!("Group {slug}")),
        slug: Set(slug.to_string()),
        description: Set(format!("All about {slug}")),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a post with an explicit creation time.
pub async fn seed_post(
    db: &DatabaseConnection,
    author: &user::Model,
    group: Option<&group::Model>,
    text: &str,
    created: DateTime<FixedOffset>,
) -> Result<post::Model, DbErr> {
    post::ActiveModel {
        text: Set(text.to_string()),
        created: Set(created),
        author_id: Set(author.id),
        group_id: Set(group.map(|g| g.id)),
        image: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}
