//! End-to-end requests through the axum router.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use local_library::db::repository::{
    AuthorRepository, BookRepository, FullRepository, GenreRepository,
};
use local_library::db::LocalRepository;
use local_library::http::{create_router, AppState};

fn app_with(repo: Arc<LocalRepository>) -> Router {
    create_router(AppState::new(repo as Arc<dyn FullRepository>))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let app = app_with(Arc::new(LocalRepository::new()));
    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog");
}

#[tokio::test]
async fn test_health_reports_connected() {
    let app = app_with(Arc::new(LocalRepository::new()));
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_index_renders_counts() {
    let seeded = support::seeded_catalog().await;
    let app = app_with(Arc::new(seeded.repo));

    let response = app.oneshot(get("/catalog")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["template"], "index");
    assert_eq!(body["data"]["book_count"], 1);
    assert_eq!(body["data"]["book_instance_available_count"], 1);
}

#[tokio::test]
async fn test_create_genre_redirects_to_detail() {
    let repo = Arc::new(LocalRepository::new());
    let app = app_with(repo.clone());

    let response = app
        .oneshot(post_form("/catalog/genre/create", "name=Fantasy"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let genre = repo.find_genre_by_name("Fantasy").await.unwrap().unwrap();
    assert_eq!(location(&response), genre.url());
}

#[tokio::test]
async fn test_invalid_author_form_renders_errors() {
    let repo = Arc::new(LocalRepository::new());
    let app = app_with(repo.clone());

    let response = app
        .oneshot(post_form(
            "/catalog/author/create",
            "first_name=&family_name=Tolkien",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["template"], "author_form");
    assert_eq!(body["author"]["family_name"], "Tolkien");
    assert_eq!(body["errors"][0]["message"], "First name must be specified.");
    assert_eq!(repo.count_authors().await.unwrap(), 0);
}

#[tokio::test]
async fn test_book_form_accepts_repeated_genres() {
    let seeded = support::seeded_catalog().await;
    let second = seeded
        .repo
        .insert_genre(local_library::models::NewGenre {
            name: "Classics".into(),
        })
        .await
        .unwrap();
    let author = seeded.author.id;
    let first = seeded.genre.id;
    let repo = Arc::new(seeded.repo);
    let app = app_with(repo.clone());

    let body = format!(
        "title=Dune+Messiah&author={}&summary=Sequel&isbn=9780593098233&genre={}&genre={}",
        author, first, second.id
    );
    let response = app
        .oneshot(post_form("/catalog/book/create", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let books = repo.books_by_genre(second.id).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].genre.len(), 2);
}

#[tokio::test]
async fn test_missing_author_is_404() {
    let app = app_with(Arc::new(LocalRepository::new()));
    let response = app
        .oneshot(get(&format!(
            "/catalog/author/{}",
            local_library::models::AuthorId::generate()
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["template"], "error");
    assert_eq!(body["message"], "Author not found");
}

#[tokio::test]
async fn test_malformed_id_is_400() {
    let app = app_with(Arc::new(LocalRepository::new()));
    let response = app.oneshot(get("/catalog/book/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blocked_author_delete_renders_books() {
    let seeded = support::seeded_catalog().await;
    let url = format!("{}/delete", seeded.author.url());
    let repo = Arc::new(seeded.repo);
    let app = app_with(repo.clone());

    let response = app.oneshot(post_form(&url, "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["template"], "author_delete");
    assert_eq!(body["author_books"][0]["title"], "Dune");
    assert_eq!(repo.count_authors().await.unwrap(), 1);
}

#[tokio::test]
async fn test_store_outage_is_500() {
    let repo = Arc::new(LocalRepository::new());
    repo.set_offline(true);
    let app = app_with(repo);

    let response = app.oneshot(get("/catalog/genres")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
