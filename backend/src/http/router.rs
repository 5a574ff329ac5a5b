//! Router configuration for the catalog server.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::models::CATALOG_ROOT;

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        // Authors
        .route("/authors", get(handlers::author_list))
        .route(
            "/author/create",
            get(handlers::author_create_get).post(handlers::author_create_post),
        )
        .route("/author/{id}", get(handlers::author_detail))
        .route(
            "/author/{id}/delete",
            get(handlers::author_delete_get).post(handlers::author_delete_post),
        )
        .route(
            "/author/{id}/update",
            get(handlers::author_update_get).post(handlers::author_update_post),
        )
        // Genres
        .route("/genres", get(handlers::genre_list))
        .route(
            "/genre/create",
            get(handlers::genre_create_get).post(handlers::genre_create_post),
        )
        .route("/genre/{id}", get(handlers::genre_detail))
        .route(
            "/genre/{id}/delete",
            get(handlers::genre_delete_get).post(handlers::genre_delete_post),
        )
        .route(
            "/genre/{id}/update",
            get(handlers::genre_update_get).post(handlers::genre_update_post),
        )
        // Books
        .route("/books", get(handlers::book_list))
        .route(
            "/book/create",
            get(handlers::book_create_get).post(handlers::book_create_post),
        )
        .route("/book/{id}", get(handlers::book_detail))
        .route(
            "/book/{id}/delete",
            get(handlers::book_delete_get).post(handlers::book_delete_post),
        )
        .route(
            "/book/{id}/update",
            get(handlers::book_update_get).post(handlers::book_update_post),
        )
        // Copies
        .route("/bookinstances", get(handlers::book_instance_list))
        .route(
            "/bookinstance/create",
            get(handlers::book_instance_create_get).post(handlers::book_instance_create_post),
        )
        .route("/bookinstance/{id}", get(handlers::book_instance_detail))
        .route(
            "/bookinstance/{id}/delete",
            get(handlers::book_instance_delete_get).post(handlers::book_instance_delete_post),
        )
        .route(
            "/bookinstance/{id}/update",
            get(handlers::book_instance_update_get).post(handlers::book_instance_update_post),
        )
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest(CATALOG_ROOT, catalog_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FullRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        let _router = create_router(AppState::new(repo));
    }
}
