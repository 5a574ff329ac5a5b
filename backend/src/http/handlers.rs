//! HTTP handlers for the catalog.
//!
//! Each handler parses path identifiers and form bodies, delegates to the
//! matching controller in [`crate::routes`] and turns its [`Outcome`] into a
//! response: a JSON view model or a `303 See Other` redirect.

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Serialize;

use super::dto::*;
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::LibraryRepository;
use crate::models::{AuthorId, BookId, BookInstanceId, GenreId, CATALOG_ROOT};
use crate::routes::{author, book, book_instance, genre, landing, Outcome};
use crate::validation::FormData;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Outcome<T>, AppError>;

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        match self {
            Outcome::Render(view) => (StatusCode::OK, Json(view)).into_response(),
            Outcome::Redirect(url) => Redirect::to(&url).into_response(),
        }
    }
}

fn parse_id<T: FromStr>(raw: &str, entity: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Malformed {} identifier: {}", entity, raw)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.repo().health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    })
}

/// GET /
pub async fn root() -> Redirect {
    Redirect::to(CATALOG_ROOT)
}

/// GET /catalog
pub async fn index(State(state): State<AppState>) -> Outcome<Home> {
    landing::index(state.repo()).await
}

// =============================================================================
// Authors
// =============================================================================

pub async fn author_list(State(state): State<AppState>) -> HandlerResult<AuthorList> {
    Ok(author::list(state.repo()).await?)
}

pub async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<AuthorDetail> {
    let id: AuthorId = parse_id(&id, "author")?;
    Ok(author::detail(state.repo(), id).await?)
}

pub async fn author_create_get() -> Outcome<AuthorFormView> {
    author::create_form()
}

pub async fn author_create_post(
    State(state): State<AppState>,
    Form(pairs): Form<FormPairs>,
) -> HandlerResult<AuthorFormView> {
    Ok(author::create(state.repo(), &FormData::from(pairs)).await?)
}

pub async fn author_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<AuthorDetail> {
    let id: AuthorId = parse_id(&id, "author")?;
    Ok(author::delete_form(state.repo(), id).await?)
}

pub async fn author_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<AuthorDetail> {
    let id: AuthorId = parse_id(&id, "author")?;
    Ok(author::delete(state.repo(), id).await?)
}

pub async fn author_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<AuthorFormView> {
    let id: AuthorId = parse_id(&id, "author")?;
    Ok(author::update_form(state.repo(), id).await?)
}

pub async fn author_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(pairs): Form<FormPairs>,
) -> HandlerResult<AuthorFormView> {
    let id: AuthorId = parse_id(&id, "author")?;
    Ok(author::update(state.repo(), id, &FormData::from(pairs)).await?)
}

// =============================================================================
// Genres
// =============================================================================

pub async fn genre_list(State(state): State<AppState>) -> HandlerResult<GenreList> {
    Ok(genre::list(state.repo()).await?)
}

pub async fn genre_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<GenreDetail> {
    let id: GenreId = parse_id(&id, "genre")?;
    Ok(genre::detail(state.repo(), id).await?)
}

pub async fn genre_create_get() -> Outcome<GenreFormView> {
    genre::create_form()
}

pub async fn genre_create_post(
    State(state): State<AppState>,
    Form(pairs): Form<FormPairs>,
) -> HandlerResult<GenreFormView> {
    Ok(genre::create(state.repo(), &FormData::from(pairs)).await?)
}

pub async fn genre_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<GenreDetail> {
    let id: GenreId = parse_id(&id, "genre")?;
    Ok(genre::delete_form(state.repo(), id).await?)
}

pub async fn genre_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<GenreDetail> {
    let id: GenreId = parse_id(&id, "genre")?;
    Ok(genre::delete(state.repo(), id).await?)
}

pub async fn genre_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<GenreFormView> {
    let id: GenreId = parse_id(&id, "genre")?;
    Ok(genre::update_form(state.repo(), id).await?)
}

pub async fn genre_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(pairs): Form<FormPairs>,
) -> HandlerResult<GenreFormView> {
    let id: GenreId = parse_id(&id, "genre")?;
    Ok(genre::update(state.repo(), id, &FormData::from(pairs)).await?)
}

// =============================================================================
// Books
// =============================================================================

pub async fn book_list(State(state): State<AppState>) -> HandlerResult<BookList> {
    Ok(book::list(state.repo()).await?)
}

pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookDetailView> {
    let id: BookId = parse_id(&id, "book")?;
    Ok(book::detail(state.repo(), id).await?)
}

pub async fn book_create_get(State(state): State<AppState>) -> HandlerResult<BookFormView> {
    Ok(book::create_form(state.repo()).await?)
}

pub async fn book_create_post(
    State(state): State<AppState>,
    Form(pairs): Form<FormPairs>,
) -> HandlerResult<BookFormView> {
    Ok(book::create(state.repo(), &FormData::from(pairs)).await?)
}

pub async fn book_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookDelete> {
    let id: BookId = parse_id(&id, "book")?;
    Ok(book::delete_form(state.repo(), id).await?)
}

pub async fn book_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookDelete> {
    let id: BookId = parse_id(&id, "book")?;
    Ok(book::delete(state.repo(), id).await?)
}

pub async fn book_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookFormView> {
    let id: BookId = parse_id(&id, "book")?;
    Ok(book::update_form(state.repo(), id).await?)
}

pub async fn book_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(pairs): Form<FormPairs>,
) -> HandlerResult<BookFormView> {
    let id: BookId = parse_id(&id, "book")?;
    Ok(book::update(state.repo(), id, &FormData::from(pairs)).await?)
}

// =============================================================================
// Book instances
// =============================================================================

pub async fn book_instance_list(State(state): State<AppState>) -> HandlerResult<BookInstanceList> {
    Ok(book_instance::list(state.repo()).await?)
}

pub async fn book_instance_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookInstanceDetail> {
    let id: BookInstanceId = parse_id(&id, "book instance")?;
    Ok(book_instance::detail(state.repo(), id).await?)
}

pub async fn book_instance_create_get(
    State(state): State<AppState>,
) -> HandlerResult<BookInstanceFormView> {
    Ok(book_instance::create_form(state.repo()).await?)
}

pub async fn book_instance_create_post(
    State(state): State<AppState>,
    Form(pairs): Form<FormPairs>,
) -> HandlerResult<BookInstanceFormView> {
    Ok(book_instance::create(state.repo(), &FormData::from(pairs)).await?)
}

pub async fn book_instance_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookInstanceDetail> {
    let id: BookInstanceId = parse_id(&id, "book instance")?;
    Ok(book_instance::delete_form(state.repo(), id).await?)
}

pub async fn book_instance_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookInstanceDetail> {
    let id: BookInstanceId = parse_id(&id, "book instance")?;
    Ok(book_instance::delete(state.repo(), id).await?)
}

pub async fn book_instance_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<BookInstanceFormView> {
    let id: BookInstanceId = parse_id(&id, "book instance")?;
    Ok(book_instance::update_form(state.repo(), id).await?)
}

pub async fn book_instance_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(pairs): Form<FormPairs>,
) -> HandlerResult<BookInstanceFormView> {
    let id: BookInstanceId = parse_id(&id, "book instance")?;
    Ok(book_instance::update(state.repo(), id, &FormData::from(pairs)).await?)
}
