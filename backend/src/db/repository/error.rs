//! Error types for repository operations.
//!
//! Every failure carries an [`ErrorContext`] naming the operation, the entity
//! kind and, when known, the identifier involved.

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Where a repository failure happened and whether replaying it may succeed.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// e.g. "insert_author", "books_by_genre"
    pub operation: Option<String>,
    /// e.g. "author", "book_instance"
    pub entity: Option<String>,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labelled = [
            ("operation", &self.operation),
            ("entity", &self.entity),
            ("id", &self.entity_id),
            ("details", &self.details),
        ];
        let mut parts: Vec<String> = labelled
            .iter()
            .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}={}", label, v)))
            .collect();
        if self.retryable {
            parts.push("retryable=true".into());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Store unreachable, offline or out of pooled connections. Retryable.
    #[error("Connection error: {message} {context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    #[error("Query error: {message} {context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// A write would break a uniqueness rule, such as a second genre with the
    /// same name.
    #[error("Conflict: {message} {context}")]
    Conflict {
        message: String,
        context: ErrorContext,
    },

    /// A stored row could not be mapped back onto an entity.
    #[error("Data validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },
}

/// Generates a `name(message)` constructor with an empty context and a
/// `name_with_context(message, context)` constructor for each variant.
macro_rules! constructors {
    ($($variant:ident => $plain:ident, $contextual:ident;)*) => {
        impl RepositoryError {
            $(
                pub fn $plain(message: impl Into<String>) -> Self {
                    Self::$contextual(message, ErrorContext::default())
                }

                pub fn $contextual(message: impl Into<String>, context: ErrorContext) -> Self {
                    Self::$variant {
                        message: message.into(),
                        context,
                    }
                }
            )*
        }
    };
}

constructors! {
    QueryError => query, query_with_context;
    NotFound => not_found, not_found_with_context;
    Conflict => conflict, conflict_with_context;
    ValidationError => validation, validation_with_context;
    ConfigurationError => configuration, configuration_with_context;
    InternalError => internal, internal_with_context;
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::connection_with_context(message, ErrorContext::default())
    }

    /// Connection failures are always marked retryable.
    pub fn connection_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Split into the message and context every variant carries.
    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            Self::ConnectionError { message, context }
            | Self::QueryError { message, context }
            | Self::NotFound { message, context }
            | Self::Conflict { message, context }
            | Self::ValidationError { message, context }
            | Self::ConfigurationError { message, context }
            | Self::InternalError { message, context } => (message.as_str(), context),
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::Conflict { context, .. }
            | Self::ValidationError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. } => context,
        }
    }

    pub fn message(&self) -> &str {
        self.parts().0
    }

    pub fn context(&self) -> &ErrorContext {
        self.parts().1
    }

    /// Only connection and query failures may be replayed, and only when the
    /// context says so.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError { .. } | Self::QueryError { .. })
            && self.context().retryable
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>, id: impl ToString) -> Self {
        let context = self.context_mut();
        context.entity = Some(entity.into());
        context.entity_id = Some(id.to_string());
        self
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => Self::not_found("Record not found"),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let constraint = info.constraint_name().unwrap_or("unique").to_string();
                Self::conflict_with_context(
                    info.message(),
                    ErrorContext::default().with_details(format!("constraint={}", constraint)),
                )
            }
            Error::DatabaseError(kind, info) => {
                let context = ErrorContext::default().with_details(format!("db_error_kind={:?}", kind));
                let context = match kind {
                    DatabaseErrorKind::SerializationFailure => context.retryable(),
                    _ => context,
                };
                Self::query_with_context(info.message(), context)
            }
            Error::DeserializationError(e) => {
                Self::validation(format!("Could not decode stored value: {}", e))
            }
            Error::QueryBuilderError(e) => Self::query(format!("Query builder error: {}", e)),
            Error::SerializationError(e) => Self::internal(format!("Serialization error: {}", e)),
            other => Self::query(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Self::connection_with_context(
            err.to_string(),
            ErrorContext::default().with_details("pool_error"),
        )
    }
}
