//! Failures a controller propagates to the generic error handler.
//!
//! Validation failures are not errors: they re-render the form.

use thiserror::Error;

use crate::db::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum RouteError {
    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Store lookup or write failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RouteError {
    pub fn not_found(message: impl Into<String>) -> Self {
        RouteError::NotFound(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            RouteError::NotFound(_) => true,
            RouteError::Repository(e) => e.is_not_found(),
        }
    }
}

pub type RouteResult<T> = Result<T, RouteError>;
