use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{authors, book_genres, book_instances, books, genres};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{
    Author, AuthorId, Book, BookId, BookInstance, BookInstanceId, BookStatus, Genre, GenreId,
    NewAuthor, NewBook, NewBookInstance, NewGenre,
};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct AuthorRow {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorRow {
    pub fn new(id: AuthorId, author: NewAuthor) -> Self {
        Self {
            id: id.value(),
            first_name: author.first_name,
            family_name: author.family_name,
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
        }
    }
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Author {
            id: AuthorId::new(row.id),
            first_name: row.first_name,
            family_name: row.family_name,
            date_of_birth: row.date_of_birth,
            date_of_death: row.date_of_death,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = genres)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GenreRow {
    pub id: Uuid,
    pub name: String,
}

impl GenreRow {
    pub fn new(id: GenreId, genre: NewGenre) -> Self {
        Self {
            id: id.value(),
            name: genre.name,
        }
    }
}

impl From<GenreRow> for Genre {
    fn from(row: GenreRow) -> Self {
        Genre {
            id: GenreId::new(row.id),
            name: row.name,
        }
    }
}

/// A `books` row; genres live in `book_genres`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub summary: String,
    pub isbn: String,
}

impl BookRow {
    pub fn new(id: BookId, book: &NewBook) -> Self {
        Self {
            id: id.value(),
            title: book.title.clone(),
            author_id: book.author.value(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
        }
    }

    pub fn into_book(self, mut genre: Vec<GenreId>) -> Book {
        genre.sort();
        Book {
            id: BookId::new(self.id),
            title: self.title,
            author: AuthorId::new(self.author_id),
            summary: self.summary,
            isbn: self.isbn,
            genre,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = book_genres)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookGenreRow {
    pub book_id: Uuid,
    pub genre_id: Uuid,
}

impl BookGenreRow {
    pub fn for_book(id: BookId, book: &NewBook) -> Vec<Self> {
        let mut genre = book.genre.clone();
        genre.sort();
        genre.dedup();
        genre
            .into_iter()
            .map(|g| BookGenreRow {
                book_id: id.value(),
                genre_id: g.value(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = book_instances)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct BookInstanceRow {
    pub id: Uuid,
    pub book_id: Uuid,
    pub imprint: String,
    pub status: String,
    pub due_back: Option<NaiveDate>,
}

impl BookInstanceRow {
    pub fn new(id: BookInstanceId, instance: NewBookInstance) -> Self {
        Self {
            id: id.value(),
            book_id: instance.book.value(),
            imprint: instance.imprint,
            status: instance.status.as_str().to_string(),
            due_back: instance.due_back,
        }
    }
}

impl TryFrom<BookInstanceRow> for BookInstance {
    type Error = RepositoryError;

    fn try_from(row: BookInstanceRow) -> RepositoryResult<Self> {
        let status: BookStatus = row.status.parse().map_err(|e: crate::models::UnknownStatus| {
            RepositoryError::validation_with_context(
                e.to_string(),
                ErrorContext::new("decode_book_instance")
                    .with_entity("book_instance")
                    .with_entity_id(row.id),
            )
        })?;
        Ok(BookInstance {
            id: BookInstanceId::new(row.id),
            book: BookId::new(row.book_id),
            imprint: row.imprint,
            status,
            due_back: row.due_back,
        })
    }
}
