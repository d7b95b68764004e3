use crate::models::{Group, Post, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers talk
/// to this trait instead of a concrete database, so the same routing and
/// authorization logic runs against Postgres in production and against the
/// in-memory implementation in tests.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
///
/// Listing methods page with `LIMIT`/`OFFSET` semantics and are always paired
/// with a count method so callers can clamp the requested page first.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Post retrieval ---
    async fn list_recent_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error>;
    async fn count_posts(&self) -> Result<i64, sqlx::Error>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error>;

    // --- Group feed ---
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, sqlx::Error>;
    async fn list_posts_by_group(
        &self,
        group_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error>;
    async fn count_posts_by_group(&self, group_id: Uuid) -> Result<i64, sqlx::Error>;

    // --- Author feed ---
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;
    async fn list_posts_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error>;
    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64, sqlx::Error>;

    // --- Post mutations ---
    async fn create_post(
        &self,
        author_id: Uuid,
        text: String,
        group_id: Option<Uuid>,
    ) -> Result<Post, sqlx::Error>;
    // Edits never touch author_id or created_at. Returns None if the post is gone.
    async fn update_post(
        &self,
        id: Uuid,
        text: String,
        group_id: Option<Uuid>,
    ) -> Result<Option<Post>, sqlx::Error>;

    // --- Users & groups ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error>;
    async fn create_group(&self, group: Group) -> Result<Group, sqlx::Error>;
    // Detaches the group's posts (group becomes NULL) rather than deleting them.
    async fn delete_group(&self, id: Uuid) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database. Post queries join `users` (always) and `groups` (left)
/// so every returned `Post` carries its author username and group slug.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_recent_posts
    ///
    /// The home feed: every post, newest first.
    async fn list_recent_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, u.username AS author_username,
                   p.group_id, g.slug AS group_slug,
                   p.text, p.created_at, p.updated_at
            FROM posts p
            JOIN users u ON p.author_id = u.id
            LEFT JOIN groups g ON p.group_id = g.id
            ORDER BY p.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_posts(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, u.username AS author_username,
                   p.group_id, g.slug AS group_slug,
                   p.text, p.created_at, p.updated_at
            FROM posts p
            JOIN users u ON p.author_id = u.id
            LEFT JOIN groups g ON p.group_id = g.id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>(
            "SELECT id, slug, title, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_posts_by_group(
        &self,
        group_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, u.username AS author_username,
                   p.group_id, g.slug AS group_slug,
                   p.text, p.created_at, p.updated_at
            FROM posts p
            JOIN users u ON p.author_id = u.id
            LEFT JOIN groups g ON p.group_id = g.id
            WHERE p.group_id = $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(group_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_posts_by_group(&self, group_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, username, email FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_posts_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, u.username AS author_username,
                   p.group_id, g.slug AS group_slug,
                   p.text, p.created_at, p.updated_at
            FROM posts p
            JOIN users u ON p.author_id = u.id
            LEFT JOIN groups g ON p.group_id = g.id
            WHERE p.author_id = $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
    }

    /// create_post
    ///
    /// Inserts the post and joins the author (and optional group) in the same
    /// statement via a CTE, so the enriched `Post` comes back in one round trip.
    async fn create_post(
        &self,
        author_id: Uuid,
        text: String,
        group_id: Option<Uuid>,
    ) -> Result<Post, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (id, author_id, group_id, text, created_at, updated_at)
                VALUES ($1, $2, $3, $4, NOW(), NOW())
                RETURNING id, author_id, group_id, text, created_at, updated_at
            )
            SELECT p.id, p.author_id, u.username AS author_username,
                   p.group_id, g.slug AS group_slug,
                   p.text, p.created_at, p.updated_at
            FROM inserted p
            JOIN users u ON p.author_id = u.id
            LEFT JOIN groups g ON p.group_id = g.id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(group_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
    }

    /// update_post
    ///
    /// Replaces text and group assignment, bumps `updated_at`, and leaves
    /// `author_id` and `created_at` untouched.
    async fn update_post(
        &self,
        id: Uuid,
        text: String,
        group_id: Option<Uuid>,
    ) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE posts
                SET text = $2, group_id = $3, updated_at = NOW()
                WHERE id = $1
                RETURNING id, author_id, group_id, text, created_at, updated_at
            )
            SELECT p.id, p.author_id, u.username AS author_username,
                   p.group_id, g.slug AS group_slug,
                   p.text, p.created_at, p.updated_at
            FROM updated p
            JOIN users u ON p.author_id = u.id
            LEFT JOIN groups g ON p.group_id = g.id
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, username, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email) VALUES ($1, $2, $3) RETURNING id, username, email",
        )
        .bind(user.id)
        .bind(user.username)
        .bind(user.email)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_group(&self, group: Group) -> Result<Group, sqlx::Error> {
        sqlx::query_as::<_, Group>(
            "INSERT INTO groups (id, slug, title, description) VALUES ($1, $2, $3, $4) RETURNING id, slug, title, description",
        )
        .bind(group.id)
        .bind(group.slug)
        .bind(group.title)
        .bind(group.description)
        .fetch_one(&self.pool)
        .await
    }

    /// delete_group
    ///
    /// The posts FK is `ON DELETE SET NULL`, so member posts survive with their
    /// group cleared.
    async fn delete_group(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// MemoryRepository
///
/// A full in-process implementation of `Repository` over a mutex-guarded
/// store. Integration tests run the real router against this, so handler and
/// authorization behavior is exercised without a live database.
///
/// Recency ordering matches the Postgres queries: newest `created_at` first,
/// with insertion order breaking ties (later insert wins).
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<MemoryStore>,
}

#[derive(Default)]
struct MemoryStore {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStore> {
        self.inner.lock().expect("memory repository lock poisoned")
    }
}

impl MemoryStore {
    fn ordered_posts<F>(&self, keep: F) -> Vec<Post>
    where
        F: Fn(&Post) -> bool,
    {
        let mut posts: Vec<Post> = self.posts.iter().filter(|p| keep(p)).cloned().collect();
        // Reverse to newest-insertion-first, then a stable sort on the
        // timestamp keeps that order for equal timestamps.
        posts.reverse();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    fn group_slug(&self, group_id: Option<Uuid>) -> Option<String> {
        group_id.and_then(|id| self.groups.iter().find(|g| g.id == id).map(|g| g.slug.clone()))
    }
}

fn window(posts: Vec<Post>, limit: i64, offset: i64) -> Vec<Post> {
    posts
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_recent_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
        Ok(window(self.lock().ordered_posts(|_| true), limit, offset))
    }

    async fn count_posts(&self) -> Result<i64, sqlx::Error> {
        Ok(self.lock().posts.len() as i64)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        Ok(self.lock().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, sqlx::Error> {
        Ok(self.lock().groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_posts_by_group(
        &self,
        group_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        Ok(window(
            self.lock().ordered_posts(|p| p.group_id == Some(group_id)),
            limit,
            offset,
        ))
    }

    async fn count_posts_by_group(&self, group_id: Uuid) -> Result<i64, sqlx::Error> {
        Ok(self
            .lock()
            .posts
            .iter()
            .filter(|p| p.group_id == Some(group_id))
            .count() as i64)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_posts_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        Ok(window(
            self.lock().ordered_posts(|p| p.author_id == author_id),
            limit,
            offset,
        ))
    }

    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64, sqlx::Error> {
        Ok(self
            .lock()
            .posts
            .iter()
            .filter(|p| p.author_id == author_id)
            .count() as i64)
    }

    async fn create_post(
        &self,
        author_id: Uuid,
        text: String,
        group_id: Option<Uuid>,
    ) -> Result<Post, sqlx::Error> {
        let mut store = self.lock();
        let author = store
            .users
            .iter()
            .find(|u| u.id == author_id)
            .cloned()
            .ok_or(sqlx::Error::RowNotFound)?;
        let group_slug = store.group_slug(group_id);
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            author_username: author.username,
            group_id,
            group_slug,
            text,
            created_at: now,
            updated_at: now,
        };
        store.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        id: Uuid,
        text: String,
        group_id: Option<Uuid>,
    ) -> Result<Option<Post>, sqlx::Error> {
        let mut store = self.lock();
        let group_slug = store.group_slug(group_id);
        let Some(post) = store.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.text = text;
        post.group_id = group_id;
        post.group_slug = group_slug;
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        self.lock().users.push(user.clone());
        Ok(user)
    }

    async fn create_group(&self, group: Group) -> Result<Group, sqlx::Error> {
        self.lock().groups.push(group.clone());
        Ok(group)
    }

    async fn delete_group(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut store = self.lock();
        let before = store.groups.len();
        store.groups.retain(|g| g.id != id);
        let removed = store.groups.len() != before;
        if removed {
            for post in store.posts.iter_mut().filter(|p| p.group_id == Some(id)) {
                post.group_id = None;
                post.group_slug = None;
            }
        }
        Ok(removed)
    }
}
