//! HTTP error handling: the single generic handler every failure ends in.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::routes::RouteError;

pub const ERROR_TEMPLATE: &str = "error";

/// Body of the generic failure page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPage {
    pub template: String,
    pub title: String,
    /// Error code for programmatic handling
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl ErrorPage {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            template: ERROR_TEMPLATE.to_string(),
            title: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            code: code.into(),
            message: message.into(),
            status: status.as_u16(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Malformed request, e.g. an identifier that does not parse
    BadRequest(String),
    /// Store failure; a missing record still maps to 404
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Repository(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
            }
            AppError::Repository(e) => {
                tracing::error!("repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPOSITORY_ERROR",
                    e.to_string(),
                )
            }
        };

        (status, Json(ErrorPage::new(status, code, message))).into_response()
    }
}

impl From<RouteError> for AppError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::NotFound(msg) => AppError::NotFound(msg),
            RouteError::Repository(e) => AppError::Repository(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("Author not found".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("bad id".into()), StatusCode::BAD_REQUEST),
            (
                RouteError::from(RepositoryError::not_found("gone")).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                RouteError::from(RepositoryError::connection("down")).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RouteError::from(RepositoryError::conflict("duplicate")).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_route_error_conversion() {
        let err: AppError = RouteError::not_found("Genre not found").into();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Genre not found"));
    }

    #[test]
    fn test_error_page_title() {
        let page = ErrorPage::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Book not found");
        assert_eq!(page.template, "error");
        assert_eq!(page.title, "Not Found");
        assert_eq!(page.status, 404);
    }
}
