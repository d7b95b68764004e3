use crate::{
    AppState,
    auth::{AuthUser, can_edit},
    error::{ApiError, ApiResult},
    models::{
        AuthorFeed, CreatePostRequest, GroupFeed, Post, PostDetail, PostPage, UpdatePostRequest,
    },
    pagination::{PAGE_SIZE, Paginator},
    repository::RepositoryState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

// --- Query Structs ---

/// PageQuery
///
/// The accepted query parameter for every paginated listing endpoint. The page
/// number is 1-based; out-of-range values clamp to the nearest valid page
/// instead of erroring.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    pub page: Option<i64>,
}

// --- Helpers ---

/// Resolves the optional group slug of a mutation payload to the group's id.
/// A missing or blank slug means "no group"; a slug that matches no group is
/// reported as a field error on `group`, because the slug arrived in the
/// request body rather than the URL.
async fn resolve_group(
    repo: &RepositoryState,
    slug: Option<&str>,
) -> Result<Option<Uuid>, ApiError> {
    let Some(slug) = slug.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match repo.find_group_by_slug(slug).await? {
        Some(group) => Ok(Some(group.id)),
        None => Err(ApiError::invalid_field("group", "unknown group")),
    }
}

// --- Handlers ---

/// index
///
/// [Public Route] The home feed: every post in the system, newest first, ten
/// per page.
#[utoipa::path(
    get,
    path = "/",
    params(PageQuery),
    responses((status = 200, description = "Recent posts", body = PostPage))
)]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PostPage>> {
    let paginator = Paginator::new(PAGE_SIZE);
    let total = state.repo.count_posts().await?;
    let page = paginator.clamp_page(query.page, total);

    let posts = state
        .repo
        .list_recent_posts(paginator.limit(), paginator.offset(page))
        .await?;

    Ok(Json(PostPage {
        posts,
        pagination: paginator.meta(page, total),
    }))
}

/// group_posts
///
/// [Public Route] The feed of a single group, addressed by slug. Responds 404
/// if no group carries the slug; an existing group with no posts is a 200 with
/// an empty page.
#[utoipa::path(
    get,
    path = "/group/{slug}",
    params(("slug" = String, Path, description = "Group slug"), PageQuery),
    responses(
        (status = 200, description = "Group feed", body = GroupFeed),
        (status = 404, description = "Unknown slug")
    )
)]
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<GroupFeed>> {
    let group = state
        .repo
        .find_group_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound("group"))?;

    let paginator = Paginator::new(PAGE_SIZE);
    let total = state.repo.count_posts_by_group(group.id).await?;
    let page = paginator.clamp_page(query.page, total);

    let posts = state
        .repo
        .list_posts_by_group(group.id, paginator.limit(), paginator.offset(page))
        .await?;

    Ok(Json(GroupFeed {
        group,
        posts,
        pagination: paginator.meta(page, total),
    }))
}

/// profile
///
/// [Public Route] An author's page: their account data plus everything they
/// have posted, newest first.
#[utoipa::path(
    get,
    path = "/profile/{username}",
    params(("username" = String, Path, description = "Author username"), PageQuery),
    responses(
        (status = 200, description = "Author feed", body = AuthorFeed),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<AuthorFeed>> {
    let author = state
        .repo
        .find_user_by_username(&username)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let paginator = Paginator::new(PAGE_SIZE);
    let total = state.repo.count_posts_by_author(author.id).await?;
    let page = paginator.clamp_page(query.page, total);

    let posts = state
        .repo
        .list_posts_by_author(author.id, paginator.limit(), paginator.offset(page))
        .await?;

    Ok(Json(AuthorFeed {
        author,
        posts,
        pagination: paginator.meta(page, total),
    }))
}

/// post_detail
///
/// [Public Route] A single post by id, along with how many posts its author
/// has published in total.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post detail", body = PostDetail),
        (status = 404, description = "Unknown post")
    )
)]
pub async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PostDetail>> {
    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or(ApiError::NotFound("post"))?;

    let author_post_count = state.repo.count_posts_by_author(post.author_id).await?;

    Ok(Json(PostDetail {
        post,
        author_post_count,
    }))
}

/// create_post
///
/// [Authenticated Route] Publishes a new post attributed to the requesting
/// user. Text is trimmed before validation, so whitespace-only submissions are
/// rejected as empty.
#[utoipa::path(
    post,
    path = "/create",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Empty text or unknown group"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    payload.text = payload.text.trim().to_string();
    payload.validate()?;

    let group_id = resolve_group(&state.repo, payload.group.as_deref()).await?;
    let post = state.repo.create_post(user.id, payload.text, group_id).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// edit_post
///
/// [Authenticated Route] Replaces a post's text and group assignment.
///
/// *Authorization*: only the author may edit. The checks run in order:
/// existence (404), authorship (403), then payload validation (400), so a
/// non-author probing an existing post always sees 403 regardless of payload.
#[utoipa::path(
    post,
    path = "/posts/{id}/edit",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 400, description = "Empty text or unknown group"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Unknown post")
    )
)]
pub async fn edit_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or(ApiError::NotFound("post"))?;

    if !can_edit(&user, &post) {
        return Err(ApiError::Forbidden("only the author may edit this post"));
    }

    payload.text = payload.text.trim().to_string();
    payload.validate()?;

    let group_id = resolve_group(&state.repo, payload.group.as_deref()).await?;
    let updated = state
        .repo
        .update_post(id, payload.text, group_id)
        .await?
        .ok_or(ApiError::NotFound("post"))?;

    Ok(Json(updated))
}
