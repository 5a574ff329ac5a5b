//! Repository traits for the four catalog collections.
//!
//! Lookups by identifier return `Ok(None)` when the record does not exist;
//! callers decide whether that is a 404 or a silent redirect. Updates replace
//! every field and fail with [`RepositoryError::NotFound`](super::RepositoryError)
//! when the record is gone.
//!
//! # Thread Safety
//! Implementations must be `Send + Sync` to work with async Rust.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    Author, AuthorId, Book, BookId, BookInstance, BookInstanceId, BookStatus, Genre, GenreId,
    NewAuthor, NewBook, NewBookInstance, NewGenre,
};

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// All authors ordered by family name.
    async fn list_authors(&self) -> RepositoryResult<Vec<Author>>;

    async fn get_author(&self, id: AuthorId) -> RepositoryResult<Option<Author>>;

    /// Persist a new author; the store assigns the identifier.
    async fn insert_author(&self, author: NewAuthor) -> RepositoryResult<Author>;

    /// Overwrite every field of an existing author, keeping its identifier.
    async fn update_author(&self, id: AuthorId, author: NewAuthor) -> RepositoryResult<Author>;

    /// Remove an author. Returns `false` when nothing was deleted.
    async fn delete_author(&self, id: AuthorId) -> RepositoryResult<bool>;

    async fn count_authors(&self) -> RepositoryResult<u64>;
}

#[async_trait]
pub trait GenreRepository: Send + Sync {
    /// All genres ordered by name.
    async fn list_genres(&self) -> RepositoryResult<Vec<Genre>>;

    async fn get_genre(&self, id: GenreId) -> RepositoryResult<Option<Genre>>;

    /// Resolve several genres at once. Unknown identifiers are skipped.
    async fn get_genres(&self, ids: &[GenreId]) -> RepositoryResult<Vec<Genre>>;

    /// Exact, case-sensitive lookup by name.
    async fn find_genre_by_name(&self, name: &str) -> RepositoryResult<Option<Genre>>;

    async fn insert_genre(&self, genre: NewGenre) -> RepositoryResult<Genre>;

    async fn update_genre(&self, id: GenreId, genre: NewGenre) -> RepositoryResult<Genre>;

    async fn delete_genre(&self, id: GenreId) -> RepositoryResult<bool>;

    async fn count_genres(&self) -> RepositoryResult<u64>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books ordered by title.
    async fn list_books(&self) -> RepositoryResult<Vec<Book>>;

    async fn get_book(&self, id: BookId) -> RepositoryResult<Option<Book>>;

    /// Books written by the given author, ordered by title.
    async fn books_by_author(&self, author: AuthorId) -> RepositoryResult<Vec<Book>>;

    /// Books tagged with the given genre, ordered by title.
    async fn books_by_genre(&self, genre: GenreId) -> RepositoryResult<Vec<Book>>;

    async fn insert_book(&self, book: NewBook) -> RepositoryResult<Book>;

    async fn update_book(&self, id: BookId, book: NewBook) -> RepositoryResult<Book>;

    async fn delete_book(&self, id: BookId) -> RepositoryResult<bool>;

    async fn count_books(&self) -> RepositoryResult<u64>;
}

#[async_trait]
pub trait BookInstanceRepository: Send + Sync {
    /// All copies, in no particular order.
    async fn list_book_instances(&self) -> RepositoryResult<Vec<BookInstance>>;

    async fn get_book_instance(&self, id: BookInstanceId)
        -> RepositoryResult<Option<BookInstance>>;

    /// Copies of the given book.
    async fn instances_of_book(&self, book: BookId) -> RepositoryResult<Vec<BookInstance>>;

    async fn insert_book_instance(
        &self,
        instance: NewBookInstance,
    ) -> RepositoryResult<BookInstance>;

    async fn update_book_instance(
        &self,
        id: BookInstanceId,
        instance: NewBookInstance,
    ) -> RepositoryResult<BookInstance>;

    async fn delete_book_instance(&self, id: BookInstanceId) -> RepositoryResult<bool>;

    async fn count_book_instances(&self) -> RepositoryResult<u64>;

    async fn count_book_instances_with_status(&self, status: BookStatus)
        -> RepositoryResult<u64>;
}

/// Store-level operations not tied to one collection.
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Check that the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
