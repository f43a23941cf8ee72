use arca_core::models::AssetRecord;
use arca_core::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for asset metadata records.
///
/// All lookups used by the worker go through `storage_key`, which carries a
/// unique index: queue messages identify assets by key, not by id, because
/// the record may not be visible yet when the message is published.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Insert a freshly uploaded asset's record.
    async fn insert(&self, record: &AssetRecord) -> Result<(), AppError>;

    /// Fetch one record by primary key.
    async fn get(&self, id: Uuid) -> Result<Option<AssetRecord>, AppError>;

    /// Fetch one record by its storage key.
    async fn find_by_storage_key(&self, storage_key: &str)
        -> Result<Option<AssetRecord>, AppError>;

    /// Attach thumbnail coordinates to the record owning `storage_key`,
    /// refreshing `last_modified`. Returns the updated record, or `None`
    /// when no record owns that key (not an error: the caller decides
    /// whether to retry or give up).
    ///
    /// Read-then-write, last writer wins. Concurrent updates to the same
    /// record are not serialized.
    async fn set_thumbnail(
        &self,
        storage_key: &str,
        thumbnail_key: &str,
        thumbnail_url: &str,
    ) -> Result<Option<AssetRecord>, AppError>;

    /// Delete the record owning `storage_key`. Returns whether a record
    /// existed.
    async fn delete_by_storage_key(&self, storage_key: &str) -> Result<bool, AppError>;

    /// All records, newest upload first.
    async fn list(&self) -> Result<Vec<AssetRecord>, AppError>;
}
