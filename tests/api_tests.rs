use axum::{ServiceExt, extract::Request};
use microblog::{
    AppConfig, AppState, create_router,
    models::{Group, Post, PostDetail, PostPage, User},
    repository::{MemoryRepository, Repository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config: AppConfig::default(),
    };

    // Same composition as the real server: trailing slashes are trimmed
    // before routing.
    let app = NormalizePathLayer::trim_trailing_slash().layer(create_router(state));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .await
            .unwrap();
    });

    TestApp { address, repo }
}

async fn seed_user(app: &TestApp, username: &str) -> User {
    app.repo
        .create_user(User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@t.com"),
        })
        .await
        .unwrap()
}

async fn seed_group(app: &TestApp, slug: &str) -> Group {
    app.repo
        .create_group(Group {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: format!("The {slug} group"),
            description: "A place to post".to_string(),
        })
        .await
        .unwrap()
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_post_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let author = seed_user(&app, "leo").await;
    seed_group(&app, "rust").await;

    // Create
    let response = client
        .post(&format!("{}/create", app.address))
        .header("x-user-id", author.id.to_string())
        .json(&serde_json::json!({ "text": "lifetimes are regions", "group": "rust" }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 201);
    let created: Post = response.json().await.unwrap();
    assert_eq!(created.author_username, "leo");
    assert_eq!(created.group_slug.as_deref(), Some("rust"));

    // Detail view carries the author's total post count
    let response = client
        .get(&format!("{}/posts/{}", app.address, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let detail: PostDetail = response.json().await.unwrap();
    assert_eq!(detail.post.id, created.id);
    assert_eq!(detail.author_post_count, 1);

    // Edit
    let response = client
        .post(&format!("{}/posts/{}/edit", app.address, created.id))
        .header("x-user-id", author.id.to_string())
        .json(&serde_json::json!({ "text": "lifetimes are scopes", "group": "rust" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let edited: Post = response.json().await.unwrap();
    assert_eq!(edited.text, "lifetimes are scopes");
    assert_eq!(edited.created_at, created.created_at);

    // The edited text shows up in the group feed, the author profile,
    // and the home feed.
    for uri in [
        format!("{}/group/rust", app.address),
        format!("{}/profile/leo", app.address),
        format!("{}/", app.address),
    ] {
        let body = client
            .get(&uri)
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(
            body.contains("lifetimes are scopes"),
            "expected edited post in {uri}"
        );
    }
}

#[tokio::test]
async fn test_edit_requires_the_author() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let leo = seed_user(&app, "leo").await;
    let mia = seed_user(&app, "mia").await;

    let post = app
        .repo
        .create_post(leo.id, "leo's post".to_string(), None)
        .await
        .unwrap();

    // Without any identity: 401
    let response = client
        .post(&format!("{}/posts/{}/edit", app.address, post.id))
        .json(&serde_json::json!({ "text": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // As a different user: 403
    let response = client
        .post(&format!("{}/posts/{}/edit", app.address, post.id))
        .header("x-user-id", mia.id.to_string())
        .json(&serde_json::json!({ "text": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The post is untouched.
    let stored = app.repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "leo's post");
}

#[tokio::test]
async fn test_unknown_resources_return_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for uri in [
        format!("{}/group/ghost", app.address),
        format!("{}/profile/nobody", app.address),
        format!("{}/posts/{}", app.address, Uuid::new_v4()),
    ] {
        let response = client.get(&uri).send().await.unwrap();
        assert_eq!(response.status(), 404, "expected 404 for {uri}");
    }
}

#[tokio::test]
async fn test_pagination_clamps_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let author = seed_user(&app, "leo").await;
    for i in 0..12 {
        app.repo
            .create_post(author.id, format!("post {i}"), None)
            .await
            .unwrap();
    }

    // Page far past the end clamps to the last page.
    let response = client
        .get(&format!("{}/?page=99", app.address))
        .send()
        .await
        .unwrap();
    let page: PostPage = response.json().await.unwrap();
    assert_eq!(page.pagination.page, 2);
    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.posts.len(), 2);

    // Page zero clamps to the first page.
    let response = client
        .get(&format!("{}/?page=0", app.address))
        .send()
        .await
        .unwrap();
    let page: PostPage = response.json().await.unwrap();
    assert_eq!(page.pagination.page, 1);
    assert_eq!(page.posts.len(), 10);
}
