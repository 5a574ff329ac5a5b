//! BookInstance (copy) controller.
//!
//! Copies have no dependents, so deletion is never blocked. A copy must point
//! at a book that is on file.

use log::info;
use serde::Serialize;

use super::error::{RouteError, RouteResult};
use super::view::{summaries, BookInstanceSummary, BookSummary, Outcome, View};
use crate::db::repository::{BookInstanceRepository, BookRepository, FullRepository};
use crate::models::{BookInstanceId, BookStatus, NewBookInstance, CATALOG_ROOT};
use crate::services;
use crate::validation::{
    validate, BookInstanceForm, FieldError, FieldValue, FormData, FormSchema, FormValues,
    Rejected,
};

pub const LIST_TEMPLATE: &str = "bookinstance_list";
pub const DETAIL_TEMPLATE: &str = "bookinstance_detail";
pub const FORM_TEMPLATE: &str = "bookinstance_form";
pub const DELETE_TEMPLATE: &str = "bookinstance_delete";

pub const UNKNOWN_BOOK: &str = "Book does not exist";

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceListItem {
    pub bookinstance: BookInstanceSummary,
    pub book: Option<BookSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceList {
    pub bookinstance_list: Vec<BookInstanceListItem>,
}

/// A copy with the book it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceDetail {
    pub bookinstance: BookInstanceSummary,
    pub book: Option<BookSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceFormView {
    pub bookinstance: FormValues,
    pub book_list: Vec<BookSummary>,
    pub statuses: Vec<&'static str>,
}

pub fn list_url() -> String {
    format!("{}/bookinstances", CATALOG_ROOT)
}

async fn form_view(
    repo: &dyn FullRepository,
    bookinstance: FormValues,
) -> RouteResult<BookInstanceFormView> {
    let books = services::book_instance_form_books(repo).await?;
    Ok(BookInstanceFormView {
        bookinstance,
        book_list: summaries(&books),
        statuses: BookStatus::ALL.iter().map(BookStatus::as_str).collect(),
    })
}

async fn load(
    repo: &dyn FullRepository,
    id: BookInstanceId,
) -> RouteResult<Option<BookInstanceDetail>> {
    let Some(instance) = repo.get_book_instance(id).await? else {
        return Ok(None);
    };
    let book = repo.get_book(instance.book).await?;
    Ok(Some(BookInstanceDetail {
        bookinstance: BookInstanceSummary::from(&instance),
        book: book.as_ref().map(BookSummary::from),
    }))
}

fn copy_title(detail: &BookInstanceDetail) -> String {
    let title = detail
        .book
        .as_ref()
        .map(|b| b.book.title.as_str())
        .unwrap_or_default();
    format!("Copy: {}", title)
}

pub async fn list(repo: &dyn FullRepository) -> RouteResult<Outcome<BookInstanceList>> {
    let instances = services::instances_with_books(repo).await?;
    let bookinstance_list = instances
        .iter()
        .map(|(instance, book)| BookInstanceListItem {
            bookinstance: BookInstanceSummary::from(instance),
            book: book.as_ref().map(BookSummary::from),
        })
        .collect();
    Ok(Outcome::render(
        LIST_TEMPLATE,
        "Book Instance List",
        BookInstanceList { bookinstance_list },
    ))
}

pub async fn detail(
    repo: &dyn FullRepository,
    id: BookInstanceId,
) -> RouteResult<Outcome<BookInstanceDetail>> {
    let detail = load(repo, id)
        .await?
        .ok_or_else(|| RouteError::not_found("Book copy not found"))?;
    Ok(Outcome::render(DETAIL_TEMPLATE, copy_title(&detail), detail))
}

/// Empty copy form with `Maintenance` pre-selected.
pub async fn create_form(repo: &dyn FullRepository) -> RouteResult<Outcome<BookInstanceFormView>> {
    let mut values = FormValues::new();
    values.insert(
        "status".to_string(),
        FieldValue::Single(BookStatus::default().as_str().to_string()),
    );
    let view = form_view(repo, values).await?;
    Ok(Outcome::render(FORM_TEMPLATE, "Create BookInstance", view))
}

async fn accept(
    repo: &dyn FullRepository,
    submitted: &FormData,
) -> RouteResult<Result<NewBookInstance, Rejected>> {
    let instance = match validate::<BookInstanceForm>(submitted) {
        Ok(instance) => instance,
        Err(rejected) => return Ok(Err(rejected)),
    };
    if repo.get_book(instance.book).await?.is_some() {
        return Ok(Ok(instance));
    }
    Ok(Err(Rejected {
        values: BookInstanceForm::rules().apply(submitted).values,
        errors: vec![FieldError::new("book", UNKNOWN_BOOK)],
    }))
}

pub async fn create(
    repo: &dyn FullRepository,
    submitted: &FormData,
) -> RouteResult<Outcome<BookInstanceFormView>> {
    match accept(repo, submitted).await? {
        Ok(instance) => {
            let instance = repo.insert_book_instance(instance).await?;
            info!("Created book instance {} of {}", instance.id, instance.book);
            Ok(Outcome::redirect(instance.url()))
        }
        Err(rejected) => {
            let view = form_view(repo, rejected.values).await?;
            Ok(Outcome::Render(
                View::new(FORM_TEMPLATE, "Create BookInstance", view).with_errors(rejected.errors),
            ))
        }
    }
}

pub async fn delete_form(
    repo: &dyn FullRepository,
    id: BookInstanceId,
) -> RouteResult<Outcome<BookInstanceDetail>> {
    Ok(match load(repo, id).await? {
        Some(detail) => Outcome::render(DELETE_TEMPLATE, "Delete BookInstance", detail),
        None => Outcome::redirect(list_url()),
    })
}

pub async fn delete(
    repo: &dyn FullRepository,
    id: BookInstanceId,
) -> RouteResult<Outcome<BookInstanceDetail>> {
    if repo.delete_book_instance(id).await? {
        info!("Deleted book instance {}", id);
    }
    Ok(Outcome::redirect(list_url()))
}

pub async fn update_form(
    repo: &dyn FullRepository,
    id: BookInstanceId,
) -> RouteResult<Outcome<BookInstanceFormView>> {
    let instance = repo
        .get_book_instance(id)
        .await?
        .ok_or_else(|| RouteError::not_found("Book copy not found"))?;
    let view = form_view(repo, BookInstanceForm::values_from(&instance)).await?;
    Ok(Outcome::render(FORM_TEMPLATE, "Update BookInstance", view))
}

pub async fn update(
    repo: &dyn FullRepository,
    id: BookInstanceId,
    submitted: &FormData,
) -> RouteResult<Outcome<BookInstanceFormView>> {
    if repo.get_book_instance(id).await?.is_none() {
        return Err(RouteError::not_found("Book copy not found"));
    }
    match accept(repo, submitted).await? {
        Ok(instance) => {
            let instance = repo.update_book_instance(id, instance).await?;
            Ok(Outcome::redirect(instance.url()))
        }
        Err(rejected) => {
            let view = form_view(repo, rejected.values).await?;
            Ok(Outcome::Render(
                View::new(FORM_TEMPLATE, "Update BookInstance", view).with_errors(rejected.errors),
            ))
        }
    }
}
