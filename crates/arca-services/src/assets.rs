//! Asset lifecycle service.
//!
//! Owns the upload flow (store bytes, record metadata, request processing),
//! the merged listing, and deletion. The worker side of the lifecycle lives
//! in the worker crate; it shares the same storage and store seams.

use arca_core::constants::SIGNED_URL_EXPIRY;
use arca_core::keys;
use arca_core::models::{AssetListing, AssetRecord, AssetResponse, ProcessingRequest};
use arca_core::AppError;
use arca_db::AssetStore;
use arca_processing::sanitize_filename;
use arca_queue::{ChannelError, ProcessingChannel};
use arca_storage::{Storage, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

fn storage_to_app(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(key) => AppError::NotFound(format!("Object not found: {key}")),
        StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
        other => AppError::Storage(other.to_string()),
    }
}

fn channel_to_app(err: ChannelError) -> AppError {
    AppError::Queue(err.to_string())
}

/// Coordinates storage, metadata, and the processing channel for the
/// asset lifecycle.
#[derive(Clone)]
pub struct AssetService {
    storage: Arc<dyn Storage>,
    store: Arc<dyn AssetStore>,
    channel: Arc<dyn ProcessingChannel>,
}

impl AssetService {
    pub fn new(
        storage: Arc<dyn Storage>,
        store: Arc<dyn AssetStore>,
        channel: Arc<dyn ProcessingChannel>,
    ) -> Self {
        Self {
            storage,
            store,
            channel,
        }
    }

    /// Time-bounded URL for a key, degrading to a fallback on signing
    /// failure. URL decoration never fails an operation.
    async fn signed_url_or(&self, storage_key: &str, fallback: &str) -> String {
        match self
            .storage
            .presigned_url(storage_key, SIGNED_URL_EXPIRY)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "failed to sign URL");
                fallback.to_string()
            }
        }
    }

    /// Accept an upload: store the bytes durably, record metadata, then
    /// request thumbnail derivation.
    ///
    /// The order matters. The object lands in storage before the record is
    /// inserted, and the processing request is published last, so a consumer
    /// can always download the object even when the record is not yet
    /// visible to it. Any failure after the upload is surfaced to the
    /// caller; the orphaned object stays behind for operator reconciliation.
    #[tracing::instrument(skip(self, data), fields(filename = %filename, size_bytes = data.len()))]
    pub async fn submit(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<AssetResponse, AppError> {
        let filename = sanitize_filename(filename);
        let storage_key = keys::derive_key(&filename);
        let size = data.len() as i64;

        self.storage
            .upload(&storage_key, data, content_type)
            .await
            .map_err(storage_to_app)?;

        let storage_url = self.signed_url_or(&storage_key, "").await;

        let record = AssetRecord::new(
            filename,
            content_type.to_string(),
            size,
            storage_key.clone(),
            storage_url,
        );
        self.store.insert(&record).await?;

        let backend = self.storage.backend_type();
        let request = ProcessingRequest {
            key: storage_key.clone(),
            content_type: content_type.to_string(),
            storage_type: backend,
            size,
        };
        // Bytes and record are already durable at this point. A publish
        // failure leaves a detectable inconsistency (asset without a pending
        // processing request); it is logged and surfaced, never repaired
        // silently.
        if let Err(e) = self.channel.publish(backend.as_str(), &request).await {
            tracing::error!(
                key = %storage_key,
                error = %e,
                "failed to publish processing request, asset left unprocessed"
            );
            return Err(channel_to_app(e));
        }

        tracing::info!(key = %storage_key, asset_id = %record.id, "asset submitted");
        Ok(AssetResponse::from(record))
    }

    /// Merged listing: every original object in storage, joined with its
    /// metadata record where one exists. Thumbnail objects are folded into
    /// their originals, never listed on their own.
    pub async fn list(&self) -> Result<Vec<AssetListing>, AppError> {
        let objects = self.storage.list().await.map_err(storage_to_app)?;
        let records = self.store.list().await?;

        let records_by_key: HashMap<&str, &AssetRecord> = records
            .iter()
            .map(|r| (r.storage_key.as_str(), r))
            .collect();
        let object_keys: std::collections::HashSet<&str> =
            objects.iter().map(|o| o.key.as_str()).collect();

        let mut listings = Vec::new();
        for object in &objects {
            if keys::is_thumbnail_key(&object.key) {
                continue;
            }

            let record = records_by_key.get(object.key.as_str());

            let display_name = record
                .map(|r| r.filename.clone())
                .unwrap_or_else(|| keys::display_filename(&object.key).to_string());
            let uploaded_at = record
                .map(|r| r.uploaded_at)
                .unwrap_or(object.last_modified);

            let url = self.signed_url_or(&object.key, &object.url).await;

            // Prefer the recorded thumbnail; fall back to a sibling object
            // whose key matches the derivation rule.
            let thumbnail_key = match record.and_then(|r| r.thumbnail_key.clone()) {
                Some(key) => Some(key),
                None => {
                    let derived = keys::thumbnail_key(&object.key);
                    object_keys.contains(derived.as_str()).then_some(derived)
                }
            };
            let thumbnail_url = match thumbnail_key {
                Some(key) => Some(self.signed_url_or(&key, "").await),
                None => None,
            };

            listings.push(AssetListing {
                key: object.key.clone(),
                display_name,
                size: object.size,
                last_modified: object.last_modified,
                uploaded_at,
                url,
                thumbnail_url,
            });
        }

        listings.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(listings)
    }

    /// Fetch one asset by id with freshly signed URLs.
    pub async fn get(&self, id: Uuid) -> Result<AssetResponse, AppError> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset not found: {id}")))?;

        let url = self.signed_url_or(&record.storage_key, &record.storage_url).await;
        let thumbnail_url = match &record.thumbnail_key {
            Some(key) => Some(self.signed_url_or(key, "").await),
            None => None,
        };

        let mut response = AssetResponse::from(record);
        response.url = url;
        if thumbnail_url.is_some() {
            response.thumbnail_url = thumbnail_url;
        }
        Ok(response)
    }

    /// Delete an asset: original object, thumbnail object, and record.
    ///
    /// Storage deletes are idempotent, so a retry after a partial failure
    /// converges instead of erroring.
    #[tracing::instrument(skip(self), fields(asset_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset not found: {id}")))?;

        self.storage
            .delete(&record.storage_key)
            .await
            .map_err(storage_to_app)?;

        // The thumbnail may not exist yet; derive its key rather than trust
        // the record, so an unrecorded thumbnail cannot be orphaned.
        let thumbnail_key = record
            .thumbnail_key
            .clone()
            .unwrap_or_else(|| keys::thumbnail_key(&record.storage_key));
        self.storage
            .delete(&thumbnail_key)
            .await
            .map_err(storage_to_app)?;

        self.store.delete_by_storage_key(&record.storage_key).await?;

        tracing::info!(key = %record.storage_key, "asset deleted");
        Ok(())
    }
}
