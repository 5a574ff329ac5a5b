//! Genre controller.
//!
//! Genre names are unique by exact value: creating a genre whose name already
//! exists redirects to the existing record instead of inserting a duplicate.
//! The store enforces the same rule, so a create that loses a race to an
//! identical one still lands on the surviving genre. Renaming a genre onto a
//! taken name re-renders the form.

use log::info;
use serde::Serialize;

use super::error::{RouteError, RouteResult};
use super::view::{summaries, BookSummary, GenreSummary, Outcome, View};
use crate::db::repository::{FullRepository, GenreRepository};
use crate::models::{GenreId, NewGenre, CATALOG_ROOT};
use crate::services;
use crate::validation::{
    validate, FieldError, FormData, FormSchema, FormValues, GenreForm, Rejected,
};

pub const LIST_TEMPLATE: &str = "genre_list";
pub const DETAIL_TEMPLATE: &str = "genre_detail";
pub const FORM_TEMPLATE: &str = "genre_form";
pub const DELETE_TEMPLATE: &str = "genre_delete";

pub const DUPLICATE_NAME: &str = "Genre name already exists";

#[derive(Debug, Clone, Serialize)]
pub struct GenreList {
    pub genre_list: Vec<GenreSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreDetail {
    pub genre: GenreSummary,
    pub genre_books: Vec<BookSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreFormView {
    pub genre: FormValues,
}

pub fn list_url() -> String {
    format!("{}/genres", CATALOG_ROOT)
}

fn rejected(title: &str, rejected: Rejected) -> Outcome<GenreFormView> {
    Outcome::Render(
        View::new(FORM_TEMPLATE, title, GenreFormView { genre: rejected.values })
            .with_errors(rejected.errors),
    )
}

async fn load(repo: &dyn FullRepository, id: GenreId) -> RouteResult<Option<GenreDetail>> {
    let (genre, books) = services::genre_with_books(repo, id).await?;
    Ok(genre.map(|genre| GenreDetail {
        genre: GenreSummary::from(&genre),
        genre_books: summaries(&books),
    }))
}

pub async fn list(repo: &dyn FullRepository) -> RouteResult<Outcome<GenreList>> {
    let genres = repo.list_genres().await?;
    Ok(Outcome::render(
        LIST_TEMPLATE,
        "Genre List",
        GenreList {
            genre_list: summaries(&genres),
        },
    ))
}

pub async fn detail(repo: &dyn FullRepository, id: GenreId) -> RouteResult<Outcome<GenreDetail>> {
    let detail = load(repo, id)
        .await?
        .ok_or_else(|| RouteError::not_found("Genre not found"))?;
    Ok(Outcome::render(DETAIL_TEMPLATE, "Genre Detail", detail))
}

pub fn create_form() -> Outcome<GenreFormView> {
    Outcome::render(
        FORM_TEMPLATE,
        "Create Genre",
        GenreFormView {
            genre: FormValues::new(),
        },
    )
}

pub async fn create(
    repo: &dyn FullRepository,
    submitted: &FormData,
) -> RouteResult<Outcome<GenreFormView>> {
    let genre = match validate::<GenreForm>(submitted) {
        Ok(genre) => genre,
        Err(errors) => return Ok(rejected("Create Genre", errors)),
    };

    if let Some(existing) = repo.find_genre_by_name(&genre.name).await? {
        return Ok(Outcome::redirect(existing.url()));
    }
    let name = genre.name.clone();
    match repo.insert_genre(genre).await {
        Ok(genre) => {
            info!("Created genre {} ({})", genre.name, genre.id);
            Ok(Outcome::redirect(genre.url()))
        }
        Err(e) if e.is_conflict() => {
            let existing = repo.find_genre_by_name(&name).await?.ok_or(e)?;
            Ok(Outcome::redirect(existing.url()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_form(
    repo: &dyn FullRepository,
    id: GenreId,
) -> RouteResult<Outcome<GenreDetail>> {
    Ok(match load(repo, id).await? {
        Some(detail) => Outcome::render(DELETE_TEMPLATE, "Delete Genre", detail),
        None => Outcome::redirect(list_url()),
    })
}

/// Delete the genre unless books are still filed under it.
pub async fn delete(repo: &dyn FullRepository, id: GenreId) -> RouteResult<Outcome<GenreDetail>> {
    let Some(detail) = load(repo, id).await? else {
        return Ok(Outcome::redirect(list_url()));
    };
    if !detail.genre_books.is_empty() {
        return Ok(Outcome::render(DELETE_TEMPLATE, "Delete Genre", detail));
    }
    repo.delete_genre(id).await?;
    info!("Deleted genre {}", id);
    Ok(Outcome::redirect(list_url()))
}

pub async fn update_form(
    repo: &dyn FullRepository,
    id: GenreId,
) -> RouteResult<Outcome<GenreFormView>> {
    let genre = repo
        .get_genre(id)
        .await?
        .ok_or_else(|| RouteError::not_found("Genre not found"))?;
    Ok(Outcome::render(
        FORM_TEMPLATE,
        "Update Genre",
        GenreFormView {
            genre: GenreForm::values_from(&genre),
        },
    ))
}

pub async fn update(
    repo: &dyn FullRepository,
    id: GenreId,
    submitted: &FormData,
) -> RouteResult<Outcome<GenreFormView>> {
    if repo.get_genre(id).await?.is_none() {
        return Err(RouteError::not_found("Genre not found"));
    }
    let genre = match validate::<GenreForm>(submitted) {
        Ok(genre) => genre,
        Err(errors) => return Ok(rejected("Update Genre", errors)),
    };
    let name = genre.name.clone();
    match repo.update_genre(id, genre).await {
        Ok(genre) => Ok(Outcome::redirect(genre.url())),
        Err(e) if e.is_conflict() => Ok(rejected(
            "Update Genre",
            Rejected {
                values: GenreForm::values_from(&NewGenre { name }.with_id(id)),
                errors: vec![FieldError::new("name", DUPLICATE_NAME)],
            },
        )),
        Err(e) => Err(e.into()),
    }
}
