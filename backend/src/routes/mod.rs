//! Catalog controllers.
//!
//! Each controller is a set of plain async functions taking the repository,
//! typed identifiers and submitted [`FormData`](crate::validation::FormData),
//! and returning an [`Outcome`]. They know nothing about HTTP.

pub mod author;
pub mod book;
pub mod book_instance;
pub mod error;
pub mod genre;
pub mod landing;
pub mod view;

pub use error::{RouteError, RouteResult};
pub use view::{Outcome, View};

#[cfg(test)]
mod tests {
    #[test]
    fn test_collection_urls() {
        assert_eq!(super::author::list_url(), "/catalog/authors");
        assert_eq!(super::genre::list_url(), "/catalog/genres");
        assert_eq!(super::book::list_url(), "/catalog/books");
        assert_eq!(super::book_instance::list_url(), "/catalog/bookinstances");
    }

    #[test]
    fn test_template_names() {
        assert_eq!(super::author::FORM_TEMPLATE, "author_form");
        assert_eq!(super::book_instance::DETAIL_TEMPLATE, "bookinstance_detail");
        assert_eq!(super::landing::INDEX_TEMPLATE, "index");
    }
}
