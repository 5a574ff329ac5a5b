//! Catalog entity schemas.
//!
//! Each entity carries its persisted fields plus the computed display and URL
//! helpers used by the views. `New*` structs hold the same fields without an
//! identifier; they are what a validated form produces and what the
//! repositories accept for inserts and full-record updates.

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod ids;
pub mod macros;

pub use author::{Author, NewAuthor};
pub use book::{Book, NewBook};
pub use book_instance::{BookInstance, BookStatus, NewBookInstance, UnknownStatus};
pub use genre::{Genre, NewGenre};
pub use ids::{AuthorId, BookId, BookInstanceId, GenreId};

/// Prefix shared by every catalog URL.
pub const CATALOG_ROOT: &str = "/catalog";

/// Human readable form of an optional date ("Jan 2, 1920"), empty when absent.
pub fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}
