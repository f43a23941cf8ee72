//! Error types module
//!
//! All errors crossing the service/API boundary are unified under `AppError`.
//! Boundary-specific errors (`StorageError`, `ChannelError`, `ThumbnailError`)
//! live in their own crates and convert into `AppError` at the service layer.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => 500,
            AppError::Storage(_) => 502,
            AppError::Queue(_) => 502,
            AppError::InvalidInput(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::PayloadTooLarge(_) => 413,
            AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Queue(_) => "QUEUE_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the request may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Queue(_))
    }

    /// Client-facing message; internal details are kept out of 5xx responses.
    pub fn client_message(&self) -> String {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).http_status_code(), 404);
        assert_eq!(AppError::InvalidInput("x".into()).http_status_code(), 400);
        assert_eq!(AppError::Storage("x".into()).http_status_code(), 502);
        assert_eq!(AppError::PayloadTooLarge("x".into()).http_status_code(), 413);
    }

    #[test]
    fn test_internal_message_hidden() {
        let err = AppError::Internal("connection string leaked".into());
        assert!(!err.client_message().contains("connection string"));
    }

    #[test]
    fn test_storage_errors_recoverable() {
        assert!(AppError::Storage("s3 down".into()).is_recoverable());
        assert!(!AppError::InvalidInput("bad".into()).is_recoverable());
    }
}
