use microblog::{
    models::{Group, Post, User},
    repository::{MemoryRepository, Repository},
};
use tokio::test;
use uuid::Uuid;

// --- Test Data Helpers ---

async fn create_test_user(repo: &MemoryRepository, username: &str) -> User {
    repo.create_user(User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@test.com"),
    })
    .await
    .expect("Failed to create test user")
}

async fn create_test_group(repo: &MemoryRepository, slug: &str) -> Group {
    repo.create_group(Group {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        title: slug.to_uppercase(),
        description: format!("Posts about {slug}"),
    })
    .await
    .expect("Failed to create test group")
}

async fn create_test_post(
    repo: &MemoryRepository,
    author: &User,
    group_id: Option<Uuid>,
    text: &str,
) -> Post {
    repo.create_post(author.id, text.to_string(), group_id)
        .await
        .expect("Failed to create test post")
}

// --- Tests ---

#[test]
async fn test_listing_orders_newest_first_with_windows() {
    let repo = MemoryRepository::new();
    let author = create_test_user(&repo, "leo").await;
    for i in 1..=5 {
        create_test_post(&repo, &author, None, &format!("post {i}")).await;
    }

    assert_eq!(repo.count_posts().await.unwrap(), 5);

    let first_window = repo.list_recent_posts(2, 0).await.unwrap();
    let texts: Vec<&str> = first_window.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["post 5", "post 4"]);

    let second_window = repo.list_recent_posts(2, 2).await.unwrap();
    let texts: Vec<&str> = second_window.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["post 3", "post 2"]);

    // An offset past the end yields an empty window, not an error.
    let past_the_end = repo.list_recent_posts(10, 100).await.unwrap();
    assert!(past_the_end.is_empty());
}

#[test]
async fn test_group_scoping_and_counts() {
    let repo = MemoryRepository::new();
    let author = create_test_user(&repo, "leo").await;
    let rust = create_test_group(&repo, "rust").await;
    let cooking = create_test_group(&repo, "cooking").await;

    create_test_post(&repo, &author, Some(rust.id), "lifetimes").await;
    create_test_post(&repo, &author, Some(cooking.id), "stew").await;
    create_test_post(&repo, &author, Some(rust.id), "traits").await;
    create_test_post(&repo, &author, None, "loose thoughts").await;

    assert_eq!(repo.count_posts_by_group(rust.id).await.unwrap(), 2);
    assert_eq!(repo.count_posts_by_group(cooking.id).await.unwrap(), 1);

    let rust_posts = repo.list_posts_by_group(rust.id, 10, 0).await.unwrap();
    let texts: Vec<&str> = rust_posts.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["traits", "lifetimes"]);
    assert!(rust_posts.iter().all(|p| p.group_slug.as_deref() == Some("rust")));
}

#[test]
async fn test_author_scoping_and_counts() {
    let repo = MemoryRepository::new();
    let leo = create_test_user(&repo, "leo").await;
    let mia = create_test_user(&repo, "mia").await;

    create_test_post(&repo, &leo, None, "one").await;
    create_test_post(&repo, &mia, None, "two").await;
    create_test_post(&repo, &leo, None, "three").await;

    assert_eq!(repo.count_posts_by_author(leo.id).await.unwrap(), 2);
    assert_eq!(repo.count_posts_by_author(mia.id).await.unwrap(), 1);

    let leos = repo.list_posts_by_author(leo.id, 10, 0).await.unwrap();
    assert_eq!(leos.len(), 2);
    assert!(leos.iter().all(|p| p.author_username == "leo"));
}

#[test]
async fn test_lookups_by_slug_and_username() {
    let repo = MemoryRepository::new();
    let user = create_test_user(&repo, "leo").await;
    let group = create_test_group(&repo, "rust").await;

    let found_user = repo.find_user_by_username("leo").await.unwrap();
    assert_eq!(found_user.map(|u| u.id), Some(user.id));
    assert!(repo.find_user_by_username("nobody").await.unwrap().is_none());

    let found_group = repo.find_group_by_slug("rust").await.unwrap();
    assert_eq!(found_group.map(|g| g.id), Some(group.id));
    assert!(repo.find_group_by_slug("ghost").await.unwrap().is_none());
}

#[test]
async fn test_get_post_carries_enriched_fields() {
    let repo = MemoryRepository::new();
    let author = create_test_user(&repo, "leo").await;
    let group = create_test_group(&repo, "rust").await;
    let post = create_test_post(&repo, &author, Some(group.id), "hello").await;

    let fetched = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(fetched.author_username, "leo");
    assert_eq!(fetched.group_slug.as_deref(), Some("rust"));

    assert!(repo.get_post(Uuid::new_v4()).await.unwrap().is_none());
}

#[test]
async fn test_update_preserves_author_and_creation_time() {
    let repo = MemoryRepository::new();
    let author = create_test_user(&repo, "leo").await;
    let group = create_test_group(&repo, "rust").await;
    let post = create_test_post(&repo, &author, None, "draft").await;

    let updated = repo
        .update_post(post.id, "published".to_string(), Some(group.id))
        .await
        .unwrap()
        .expect("post should exist");

    assert_eq!(updated.text, "published");
    assert_eq!(updated.group_id, Some(group.id));
    assert_eq!(updated.group_slug.as_deref(), Some("rust"));
    assert_eq!(updated.author_id, post.author_id);
    assert_eq!(updated.created_at, post.created_at);
    assert!(updated.updated_at >= post.updated_at);

    // The stored copy reflects the edit.
    let stored = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "published");
}

#[test]
async fn test_update_unknown_post_returns_none() {
    let repo = MemoryRepository::new();

    let updated = repo
        .update_post(Uuid::new_v4(), "text".to_string(), None)
        .await
        .unwrap();

    assert!(updated.is_none());
}

#[test]
async fn test_create_post_requires_existing_author() {
    let repo = MemoryRepository::new();

    let result = repo
        .create_post(Uuid::new_v4(), "orphan".to_string(), None)
        .await;

    assert!(result.is_err());
}

#[test]
async fn test_delete_group_detaches_posts_without_deleting_them() {
    let repo = MemoryRepository::new();
    let author = create_test_user(&repo, "leo").await;
    let group = create_test_group(&repo, "rust").await;
    let post = create_test_post(&repo, &author, Some(group.id), "keep me").await;

    assert!(repo.delete_group(group.id).await.unwrap());
    assert!(repo.find_group_by_slug("rust").await.unwrap().is_none());

    // The post survives with its group reference cleared.
    let survivor = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(survivor.text, "keep me");
    assert_eq!(survivor.group_id, None);
    assert_eq!(survivor.group_slug, None);

    // Deleting again reports that nothing was removed.
    assert!(!repo.delete_group(group.id).await.unwrap());
}
