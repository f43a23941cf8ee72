//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement, plus the error taxonomy shared by every backend.

use arca_core::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
///
/// `NotFound` is the only permanent failure; the remaining variants describe
/// transient backend trouble and are retried by the caller's own policy.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether retrying (e.g. via queue redelivery) can help.
    pub fn is_transient(&self) -> bool {
        !matches!(self, StorageError::NotFound(_) | StorageError::InvalidKey(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One stored object as reported by a backend listing.
#[derive(Debug, Clone)]
pub struct StorageObject {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub url: String,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem, in-memory) must implement this
/// trait so the upload path and the worker can run against any backend
/// without coupling to implementation details.
#[async_trait]
pub trait Storage: Send + Sync {
    /// List every stored object. Finite and restartable; ordering follows the
    /// backend's default.
    async fn list(&self) -> StorageResult<Vec<StorageObject>>;

    /// Upload data under the given key with overwrite semantics
    /// (last-writer-wins; no optimistic concurrency).
    async fn upload(&self, storage_key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<()>;

    /// Download an object by its storage key. `NotFound` when the key does
    /// not exist.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by key. Idempotent: deleting a missing key is Ok.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Generate a time-bounded read-only URL for the object.
    ///
    /// Callers that merely decorate responses should degrade a signing
    /// failure to an empty URL rather than failing the operation; URL
    /// generation is not on the durability path.
    async fn presigned_url(&self, storage_key: &str, expires_in: Duration)
        -> StorageResult<String>;

    /// The backend type this implementation serves.
    fn backend_type(&self) -> StorageBackend;
}
