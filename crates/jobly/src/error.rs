//! Error types for jobly

use thiserror::Error;

/// Result type alias for jobly operations
pub type JoblyResult<T> = Result<T, JoblyError>;

/// Error types for data-layer operations.
///
/// Model functions raise these and never log or swallow them; the HTTP layer
/// maps [`JoblyError::kind`] to a status code.
#[derive(Debug, Error)]
pub enum JoblyError {
    /// Malformed or empty input (failed validation, empty patch, bad reference)
    #[error("Bad request: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unique constraint violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query execution error
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Internal(String),
}

/// Coarse classification of a [`JoblyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    Internal,
}

impl JoblyError {
    /// Create an invalid-input error with a single message
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(vec![message.into()])
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Decode { .. } | Self::Database(_) | Self::Pool(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an invalid input error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Parse a tokio_postgres error into a more specific JoblyError.
    ///
    /// - `23505` unique violation: [`JoblyError::Conflict`]
    /// - `23503` foreign key violation: [`JoblyError::InvalidInput`]
    /// - `23514` check violation: [`JoblyError::InvalidInput`]
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::Conflict(format!("{constraint}: {message}")),
                "23503" | "23514" => {
                    return Self::InvalidInput(vec![format!("{constraint}: {message}")]);
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}

impl From<deadpool_postgres::PoolError> for JoblyError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<refinery::Error> for JoblyError {
    fn from(err: refinery::Error) -> Self {
        Self::Internal(format!("migration failed: {err}"))
    }
}

impl From<crate::changeset::ValidationErrors> for JoblyError {
    fn from(errs: crate::changeset::ValidationErrors) -> Self {
        Self::InvalidInput(errs.iter().map(ToString::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_collapse_storage_failures_to_internal() {
        assert_eq!(JoblyError::decode("id", "bad").kind(), ErrorKind::Internal);
        assert_eq!(JoblyError::Pool("down".into()).kind(), ErrorKind::Internal);
        assert_eq!(JoblyError::internal("x").kind(), ErrorKind::Internal);
        assert_eq!(JoblyError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(JoblyError::conflict("x").kind(), ErrorKind::Conflict);
    }

    #[test]
    fn invalid_input_joins_messages() {
        let err = JoblyError::InvalidInput(vec!["a is bad".into(), "b is bad".into()]);
        assert_eq!(err.to_string(), "Bad request: a is bad; b is bad");
        assert!(err.is_invalid_input());
    }
}
