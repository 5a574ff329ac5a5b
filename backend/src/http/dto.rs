//! Request and response bodies that are not catalog views.

use serde::{Deserialize, Serialize};

pub use crate::routes::author::{AuthorDetail, AuthorFormView, AuthorList};
pub use crate::routes::book::{BookDelete, BookDetailView, BookFormView, BookList};
pub use crate::routes::book_instance::{
    BookInstanceDetail, BookInstanceFormView, BookInstanceList,
};
pub use crate::routes::genre::{GenreDetail, GenreFormView, GenreList};
pub use crate::routes::landing::Home;

/// Raw url-encoded form body; repeated keys are kept in order.
pub type FormPairs = Vec<(String, String)>;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Store connection status
    pub database: String,
}
