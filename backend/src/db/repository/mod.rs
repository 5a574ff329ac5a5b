//! Repository trait definitions.
//!
//! Controllers and services depend only on these traits; concrete backends
//! live under [`crate::db::repositories`].

pub mod catalog;
pub mod error;

pub use catalog::{
    AuthorRepository, BookInstanceRepository, BookRepository, GenreRepository, LibraryRepository,
};
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Every repository capability the catalog needs, as a single object-safe bound.
///
/// Implemented automatically for any type implementing all the collection traits.
pub trait FullRepository:
    AuthorRepository + GenreRepository + BookRepository + BookInstanceRepository + LibraryRepository
{
}

impl<T> FullRepository for T where
    T: AuthorRepository
        + GenreRepository
        + BookRepository
        + BookInstanceRepository
        + LibraryRepository
{
}
