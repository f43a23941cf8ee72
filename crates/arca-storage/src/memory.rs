//! In-process storage backend.
//!
//! Holds objects in a map guarded by a mutex. Used by integration tests and
//! available as a configuration choice for throwaway environments.

use crate::traits::{Storage, StorageError, StorageObject, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// In-memory storage implementation
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_url(key: &str) -> String {
        format!("memory://{}", urlencoding::encode(key))
    }

    /// Number of stored objects. Test support.
    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    /// Content type recorded for a key, if present. Test support.
    pub async fn content_type_of(&self, storage_key: &str) -> Option<String> {
        self.objects
            .lock()
            .await
            .get(storage_key)
            .map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list(&self) -> StorageResult<Vec<StorageObject>> {
        let objects = self.objects.lock().await;
        Ok(objects
            .iter()
            .map(|(key, stored)| StorageObject {
                key: key.clone(),
                size: stored.data.len() as u64,
                last_modified: stored.last_modified,
                url: Self::generate_url(key),
            })
            .collect())
    }

    async fn upload(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        let mut objects = self.objects.lock().await;
        objects.insert(
            storage_key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let objects = self.objects.lock().await;
        objects
            .get(storage_key)
            .map(|stored| stored.data.clone())
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let mut objects = self.objects.lock().await;
        objects.remove(storage_key);
        Ok(())
    }

    async fn presigned_url(
        &self,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(Self::generate_url(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
