//! Book controller.
//!
//! A submission whose author or genres are well formed but not on file is
//! re-rendered with field errors instead of being saved.

use log::info;
use serde::Serialize;

use super::error::{RouteError, RouteResult};
use super::view::{
    summaries, AuthorSummary, BookInstanceSummary, BookSummary, GenreSummary, Outcome, View,
};
use crate::db::repository::{BookRepository, FullRepository};
use crate::models::{BookId, NewBook, CATALOG_ROOT};
use crate::services;
use crate::validation::{
    validate, BookForm, FieldError, FormData, FormSchema, FormValues, Rejected,
};

pub const LIST_TEMPLATE: &str = "book_list";
pub const DETAIL_TEMPLATE: &str = "book_detail";
pub const FORM_TEMPLATE: &str = "book_form";
pub const DELETE_TEMPLATE: &str = "book_delete";

pub const UNKNOWN_AUTHOR: &str = "Author does not exist";
pub const UNKNOWN_GENRE: &str = "Genre does not exist";

#[derive(Debug, Clone, Serialize)]
pub struct BookListItem {
    pub book: BookSummary,
    pub author: Option<AuthorSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookList {
    pub book_list: Vec<BookListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetailView {
    pub book: BookSummary,
    pub author: Option<AuthorSummary>,
    pub genres: Vec<GenreSummary>,
    pub book_instances: Vec<BookInstanceSummary>,
}

/// A book with the copies that block its deletion.
#[derive(Debug, Clone, Serialize)]
pub struct BookDelete {
    pub book: BookSummary,
    pub book_instances: Vec<BookInstanceSummary>,
}

/// A selectable genre, checked when the form values include it.
#[derive(Debug, Clone, Serialize)]
pub struct GenreOption {
    #[serde(flatten)]
    pub genre: GenreSummary,
    pub checked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookFormView {
    pub book: FormValues,
    pub authors: Vec<AuthorSummary>,
    pub genres: Vec<GenreOption>,
}

pub fn list_url() -> String {
    format!("{}/books", CATALOG_ROOT)
}

async fn form_view(repo: &dyn FullRepository, book: FormValues) -> RouteResult<BookFormView> {
    let (authors, genres) = services::book_form_references(repo).await?;
    let selected: Vec<String> = book
        .get("genre")
        .map(|v| v.as_list().into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    let genres = genres
        .iter()
        .map(|genre| GenreOption {
            checked: selected.contains(&genre.id.to_string()),
            genre: GenreSummary::from(genre),
        })
        .collect();

    Ok(BookFormView {
        book,
        authors: summaries(&authors),
        genres,
    })
}

pub async fn list(repo: &dyn FullRepository) -> RouteResult<Outcome<BookList>> {
    let books = services::books_with_authors(repo).await?;
    let book_list = books
        .iter()
        .map(|(book, author)| BookListItem {
            book: BookSummary::from(book),
            author: author.as_ref().map(AuthorSummary::from),
        })
        .collect();
    Ok(Outcome::render(LIST_TEMPLATE, "Book List", BookList { book_list }))
}

pub async fn detail(repo: &dyn FullRepository, id: BookId) -> RouteResult<Outcome<BookDetailView>> {
    let detail = services::book_detail(repo, id)
        .await?
        .ok_or_else(|| RouteError::not_found("Book not found"))?;
    let title = detail.book.title.clone();
    Ok(Outcome::render(
        DETAIL_TEMPLATE,
        title,
        BookDetailView {
            book: BookSummary::from(&detail.book),
            author: detail.author.as_ref().map(AuthorSummary::from),
            genres: summaries(&detail.genres),
            book_instances: summaries(&detail.instances),
        },
    ))
}

pub async fn create_form(repo: &dyn FullRepository) -> RouteResult<Outcome<BookFormView>> {
    let view = form_view(repo, FormValues::new()).await?;
    Ok(Outcome::render(FORM_TEMPLATE, "Create Book", view))
}

/// Validate the submission, then confirm its author and genres are on file.
async fn accept(
    repo: &dyn FullRepository,
    submitted: &FormData,
) -> RouteResult<Result<NewBook, Rejected>> {
    let book = match validate::<BookForm>(submitted) {
        Ok(book) => book,
        Err(rejected) => return Ok(Err(rejected)),
    };
    let dangling = services::dangling_book_references(repo, &book).await?;
    if dangling.is_empty() {
        return Ok(Ok(book));
    }

    let mut errors = Vec::new();
    if dangling.author.is_some() {
        errors.push(FieldError::new("author", UNKNOWN_AUTHOR));
    }
    errors.extend(
        dangling
            .genres
            .iter()
            .map(|_| FieldError::new("genre", UNKNOWN_GENRE)),
    );
    Ok(Err(Rejected {
        values: BookForm::rules().apply(submitted).values,
        errors,
    }))
}

pub async fn create(
    repo: &dyn FullRepository,
    submitted: &FormData,
) -> RouteResult<Outcome<BookFormView>> {
    match accept(repo, submitted).await? {
        Ok(book) => {
            let book = repo.insert_book(book).await?;
            info!("Created book {} ({})", book.title, book.id);
            Ok(Outcome::redirect(book.url()))
        }
        Err(rejected) => {
            let view = form_view(repo, rejected.values).await?;
            Ok(Outcome::Render(
                View::new(FORM_TEMPLATE, "Create Book", view).with_errors(rejected.errors),
            ))
        }
    }
}

async fn load(repo: &dyn FullRepository, id: BookId) -> RouteResult<Option<BookDelete>> {
    let (book, instances) = services::book_with_instances(repo, id).await?;
    Ok(book.map(|book| BookDelete {
        book: BookSummary::from(&book),
        book_instances: summaries(&instances),
    }))
}

pub async fn delete_form(repo: &dyn FullRepository, id: BookId) -> RouteResult<Outcome<BookDelete>> {
    Ok(match load(repo, id).await? {
        Some(view) => Outcome::render(DELETE_TEMPLATE, "Delete Book", view),
        None => Outcome::redirect(list_url()),
    })
}

/// Delete the book unless copies of it still exist.
pub async fn delete(repo: &dyn FullRepository, id: BookId) -> RouteResult<Outcome<BookDelete>> {
    let Some(view) = load(repo, id).await? else {
        return Ok(Outcome::redirect(list_url()));
    };
    if !view.book_instances.is_empty() {
        return Ok(Outcome::render(DELETE_TEMPLATE, "Delete Book", view));
    }
    repo.delete_book(id).await?;
    info!("Deleted book {}", id);
    Ok(Outcome::redirect(list_url()))
}

pub async fn update_form(
    repo: &dyn FullRepository,
    id: BookId,
) -> RouteResult<Outcome<BookFormView>> {
    let book = repo
        .get_book(id)
        .await?
        .ok_or_else(|| RouteError::not_found("Book not found"))?;
    let view = form_view(repo, BookForm::values_from(&book)).await?;
    Ok(Outcome::render(FORM_TEMPLATE, "Update Book", view))
}

pub async fn update(
    repo: &dyn FullRepository,
    id: BookId,
    submitted: &FormData,
) -> RouteResult<Outcome<BookFormView>> {
    if repo.get_book(id).await?.is_none() {
        return Err(RouteError::not_found("Book not found"));
    }
    match accept(repo, submitted).await? {
        Ok(book) => {
            let book = repo.update_book(id, book).await?;
            Ok(Outcome::redirect(book.url()))
        }
        Err(rejected) => {
            let view = form_view(repo, rejected.values).await?;
            Ok(Outcome::Render(
                View::new(FORM_TEMPLATE, "Update Book", view).with_errors(rejected.errors),
            ))
        }
    }
}
