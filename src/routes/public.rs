use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Defines the endpoints that are **unauthenticated** and accessible to any
/// client. All reads live here: the whole-site feed, group and author feeds,
/// and the single-post view. None of them reveal anything that publishing has
/// not already made public.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // GET /?page=N
        // The home feed: all posts, newest first, ten per page.
        .route("/", get(handlers::index))
        // GET /group/{slug}?page=N
        // A group's feed. 404 for unknown slugs; empty groups page normally.
        .route("/group/{slug}", get(handlers::group_posts))
        // GET /profile/{username}?page=N
        // An author's page: account data plus their posts, newest first.
        .route("/profile/{username}", get(handlers::profile))
        // GET /posts/{id}
        // A single post with its author's total post count.
        .route("/posts/{id}", get(handlers::post_detail))
}
