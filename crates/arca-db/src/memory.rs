//! In-process asset store for tests and throwaway environments.

use arca_core::models::AssetRecord;
use arca_core::AppError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::store::AssetStore;

/// HashMap-backed implementation of `AssetStore`.
#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    records: Arc<Mutex<HashMap<Uuid, AssetRecord>>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records. Test support.
    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn insert(&self, record: &AssetRecord) -> Result<(), AppError> {
        let mut records = self.records.lock().await;
        if records
            .values()
            .any(|r| r.storage_key == record.storage_key)
        {
            return Err(AppError::Internal(format!(
                "duplicate storage key: {}",
                record.storage_key
            )));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AssetRecord>, AppError> {
        Ok(self.records.lock().await.get(&id).cloned())
    }

    async fn find_by_storage_key(
        &self,
        storage_key: &str,
    ) -> Result<Option<AssetRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|r| r.storage_key == storage_key)
            .cloned())
    }

    async fn set_thumbnail(
        &self,
        storage_key: &str,
        thumbnail_key: &str,
        thumbnail_url: &str,
    ) -> Result<Option<AssetRecord>, AppError> {
        let mut records = self.records.lock().await;
        let record = records
            .values_mut()
            .find(|r| r.storage_key == storage_key);

        match record {
            Some(record) => {
                record.thumbnail_key = Some(thumbnail_key.to_string());
                record.thumbnail_url = Some(thumbnail_url.to_string());
                record.last_modified = Utc::now();
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_storage_key(&self, storage_key: &str) -> Result<bool, AppError> {
        let mut records = self.records.lock().await;
        let id = records
            .values()
            .find(|r| r.storage_key == storage_key)
            .map(|r| r.id);

        match id {
            Some(id) => {
                records.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<AssetRecord>, AppError> {
        let records = self.records.lock().await;
        let mut all: Vec<AssetRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(storage_key: &str) -> AssetRecord {
        AssetRecord::new(
            "cat.jpg".to_string(),
            "image/jpeg".to_string(),
            1024,
            storage_key.to_string(),
            format!("memory://{storage_key}"),
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_key() {
        let store = MemoryAssetStore::new();
        let record = sample_record("abc-cat.jpg");
        store.insert(&record).await.unwrap();

        let found = store.find_by_storage_key("abc-cat.jpg").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(record.id));
        assert!(store.find_by_storage_key("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_thumbnail_updates_record() {
        let store = MemoryAssetStore::new();
        let record = sample_record("abc-cat.jpg");
        store.insert(&record).await.unwrap();

        let updated = store
            .set_thumbnail("abc-cat.jpg", "abc-cat_thumbnail.jpg", "memory://thumb")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.thumbnail_key.as_deref(), Some("abc-cat_thumbnail.jpg"));
        assert!(updated.last_modified >= record.last_modified);
    }

    #[tokio::test]
    async fn test_set_thumbnail_missing_key_is_none() {
        let store = MemoryAssetStore::new();
        let result = store
            .set_thumbnail("ghost.jpg", "ghost_thumbnail.jpg", "")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = MemoryAssetStore::new();
        store.insert(&sample_record("abc-cat.jpg")).await.unwrap();

        assert!(store.delete_by_storage_key("abc-cat.jpg").await.unwrap());
        assert!(!store.delete_by_storage_key("abc-cat.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryAssetStore::new();
        let mut first = sample_record("a-first.jpg");
        first.uploaded_at = Utc::now() - chrono::Duration::minutes(5);
        let second = sample_record("b-second.jpg");
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].storage_key, "b-second.jpg");
    }
}
