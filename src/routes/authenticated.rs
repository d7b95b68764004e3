use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Authenticated Router Module
///
/// Defines the routes that mutate content and therefore require a validated
/// user session.
///
/// Access Control Strategy:
/// Every handler here relies on the `AuthUser` extractor middleware being
/// present on the router layer above this module, which guarantees the handler
/// receives a resolved `AuthUser`. Authorship checks (only the author may
/// edit) then run inside the handler against that identity.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /create
        // Publishes a new post attributed to the authenticated user.
        .route("/create", post(handlers::create_post))
        // POST /posts/{id}/edit
        // Replaces the text and group assignment of the user's own post.
        // The author-only check is enforced within the handler.
        .route("/posts/{id}/edit", post(handlers::edit_post))
}
