//! Author controller.

use log::info;
use serde::Serialize;

use super::error::{RouteError, RouteResult};
use super::view::{summaries, AuthorSummary, BookSummary, Outcome, View};
use crate::db::repository::{AuthorRepository, FullRepository};
use crate::models::{AuthorId, CATALOG_ROOT};
use crate::services;
use crate::validation::{validate, AuthorForm, FormData, FormSchema, FormValues, Rejected};

pub const LIST_TEMPLATE: &str = "author_list";
pub const DETAIL_TEMPLATE: &str = "author_detail";
pub const FORM_TEMPLATE: &str = "author_form";
pub const DELETE_TEMPLATE: &str = "author_delete";

#[derive(Debug, Clone, Serialize)]
pub struct AuthorList {
    pub author_list: Vec<AuthorSummary>,
}

/// An author with the books that reference it.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorDetail {
    pub author: AuthorSummary,
    pub author_books: Vec<BookSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorFormView {
    pub author: FormValues,
}

pub fn list_url() -> String {
    format!("{}/authors", CATALOG_ROOT)
}

fn form(title: &str, author: FormValues) -> Outcome<AuthorFormView> {
    Outcome::render(FORM_TEMPLATE, title, AuthorFormView { author })
}

fn rejected(title: &str, rejected: Rejected) -> Outcome<AuthorFormView> {
    Outcome::Render(
        View::new(FORM_TEMPLATE, title, AuthorFormView { author: rejected.values })
            .with_errors(rejected.errors),
    )
}

async fn load(repo: &dyn FullRepository, id: AuthorId) -> RouteResult<Option<AuthorDetail>> {
    let (author, books) = services::author_with_books(repo, id).await?;
    Ok(author.map(|author| AuthorDetail {
        author: AuthorSummary::from(&author),
        author_books: summaries(&books),
    }))
}

pub async fn list(repo: &dyn FullRepository) -> RouteResult<Outcome<AuthorList>> {
    let authors = repo.list_authors().await?;
    Ok(Outcome::render(
        LIST_TEMPLATE,
        "Author List",
        AuthorList {
            author_list: summaries(&authors),
        },
    ))
}

pub async fn detail(repo: &dyn FullRepository, id: AuthorId) -> RouteResult<Outcome<AuthorDetail>> {
    let detail = load(repo, id)
        .await?
        .ok_or_else(|| RouteError::not_found("Author not found"))?;
    Ok(Outcome::render(DETAIL_TEMPLATE, "Author Detail", detail))
}

pub fn create_form() -> Outcome<AuthorFormView> {
    form("Create Author", FormValues::new())
}

pub async fn create(
    repo: &dyn FullRepository,
    submitted: &FormData,
) -> RouteResult<Outcome<AuthorFormView>> {
    let author = match validate::<AuthorForm>(submitted) {
        Ok(author) => author,
        Err(errors) => return Ok(rejected("Create Author", errors)),
    };
    let author = repo.insert_author(author).await?;
    info!("Created author {}", author.id);
    Ok(Outcome::redirect(author.url()))
}

pub async fn delete_form(
    repo: &dyn FullRepository,
    id: AuthorId,
) -> RouteResult<Outcome<AuthorDetail>> {
    Ok(match load(repo, id).await? {
        Some(detail) => Outcome::render(DELETE_TEMPLATE, "Delete Author", detail),
        None => Outcome::redirect(list_url()),
    })
}

/// Delete the author unless books still reference it.
pub async fn delete(repo: &dyn FullRepository, id: AuthorId) -> RouteResult<Outcome<AuthorDetail>> {
    let Some(detail) = load(repo, id).await? else {
        return Ok(Outcome::redirect(list_url()));
    };
    if !detail.author_books.is_empty() {
        return Ok(Outcome::render(DELETE_TEMPLATE, "Delete Author", detail));
    }
    repo.delete_author(id).await?;
    info!("Deleted author {}", id);
    Ok(Outcome::redirect(list_url()))
}

pub async fn update_form(
    repo: &dyn FullRepository,
    id: AuthorId,
) -> RouteResult<Outcome<AuthorFormView>> {
    let author = repo
        .get_author(id)
        .await?
        .ok_or_else(|| RouteError::not_found("Author not found"))?;
    Ok(form("Update Author", AuthorForm::values_from(&author)))
}

pub async fn update(
    repo: &dyn FullRepository,
    id: AuthorId,
    submitted: &FormData,
) -> RouteResult<Outcome<AuthorFormView>> {
    if repo.get_author(id).await?.is_none() {
        return Err(RouteError::not_found("Author not found"));
    }
    let author = match validate::<AuthorForm>(submitted) {
        Ok(author) => author,
        Err(errors) => return Ok(rejected("Update Author", errors)),
    };
    let author = repo.update_author(id, author).await?;
    Ok(Outcome::redirect(author.url()))
}
