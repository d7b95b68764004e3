use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::pagination::PageMeta;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents an author's canonical identity record stored in the `users` table.
/// Accounts are provisioned by the external identity provider and mirrored here;
/// this service resolves them during authentication and for profile listings.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary Key, matches the external provider's subject id.
    pub id: Uuid,
    // Unique public handle, addressable via /profile/{username}.
    pub username: String,
    pub email: String,
}

/// Group
///
/// A named category that posts may belong to, stored in the `groups` table.
/// The slug is globally unique and immutable once referenced: no update
/// operation exists anywhere in the system.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Group {
    pub id: Uuid,
    // Public identifier, addressable via /group/{slug}.
    pub slug: String,
    pub title: String,
    pub description: String,
}

/// Post
///
/// A single authored text entry from the `posts` table, enriched for API
/// responses with the author's username and the group slug (JOIN on `users`,
/// LEFT JOIN on `groups`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    // FK to users.id (Owner). Exactly one author, always.
    pub author_id: Uuid,
    // Loaded via JOIN in every repository query.
    #[sqlx(default)]
    pub author_username: String,
    // Nullable FK to groups.id. Deleting a group nulls this, never the post.
    pub group_id: Option<Uuid>,
    #[sqlx(default)]
    pub group_slug: Option<String>,
    pub text: String,

    // Set once at creation, never touched again.
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // Bumped on every successful edit.
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreatePostRequest
///
/// Input payload for publishing a new post (POST /create). The author is taken
/// from the authenticated identity, never from the payload. `group` is an
/// optional group slug; an unknown slug is reported as a field-level
/// validation error, like an invalid form choice.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "post text must not be empty"))]
    pub text: String,
    pub group: Option<String>,
}

/// UpdatePostRequest
///
/// Input payload for editing an existing post (POST /posts/{id}/edit). Same
/// validation rules as creation; passing `group: null` detaches the post from
/// its group.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, message = "post text must not be empty"))]
    pub text: String,
    pub group: Option<String>,
}

// --- Listing & Detail Schemas (Output) ---

/// PostPage
///
/// Output schema for the front-page listing (GET /): one page of posts in
/// descending creation order plus the pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub pagination: PageMeta,
}

/// GroupFeed
///
/// Output schema for a group listing (GET /group/{slug}): the group record
/// alongside one page of its posts.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct GroupFeed {
    pub group: Group,
    pub posts: Vec<Post>,
    pub pagination: PageMeta,
}

/// AuthorFeed
///
/// Output schema for a profile listing (GET /profile/{username}): the author
/// record alongside one page of their posts.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthorFeed {
    pub author: User,
    pub posts: Vec<Post>,
    pub pagination: PageMeta,
}

/// PostDetail
///
/// Output schema for a single post view (GET /posts/{id}). Carries the
/// author's total post count, which the detail page displays next to the post.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostDetail {
    pub post: Post,
    pub author_post_count: i64,
}
