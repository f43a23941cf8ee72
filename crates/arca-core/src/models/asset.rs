use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata record for one logical asset.
///
/// `storage_key`/`storage_url` locate the original bytes and are set at
/// creation. `thumbnail_key`/`thumbnail_url` stay empty until the worker has
/// derived and stored a thumbnail; reprocessing overwrites them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub storage_key: String,
    pub storage_url: String,
    pub thumbnail_key: Option<String>,
    pub thumbnail_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl AssetRecord {
    /// Build a fresh record for a newly stored original.
    pub fn new(
        filename: String,
        content_type: String,
        size: i64,
        storage_key: String,
        storage_url: String,
    ) -> Self {
        let now = Utc::now();
        AssetRecord {
            id: Uuid::new_v4(),
            filename,
            content_type,
            size,
            storage_key,
            storage_url,
            thumbnail_key: None,
            thumbnail_url: None,
            uploaded_at: now,
            last_modified: now,
        }
    }

    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail_key.is_some()
    }
}

/// API response shape for a single asset.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl From<AssetRecord> for AssetResponse {
    fn from(record: AssetRecord) -> Self {
        AssetResponse {
            id: record.id,
            filename: record.filename,
            content_type: record.content_type,
            size: record.size,
            url: record.storage_url,
            thumbnail_url: record.thumbnail_url,
            uploaded_at: record.uploaded_at,
            last_modified: record.last_modified,
        }
    }
}

/// One entry of the merged listing: the storage backend's view of an object
/// joined with the metadata record where one exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetListing {
    pub key: String,
    pub display_name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Recorded upload time; falls back to the backend's last-modified
    /// timestamp when no metadata record matches the key.
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_no_thumbnail() {
        let record = AssetRecord::new(
            "cat.jpg".to_string(),
            "image/jpeg".to_string(),
            12345,
            "uuid-cat.jpg".to_string(),
            "https://example.com/uuid-cat.jpg".to_string(),
        );
        assert!(!record.has_thumbnail());
        assert_eq!(record.uploaded_at, record.last_modified);
    }

    #[test]
    fn test_response_from_record() {
        let mut record = AssetRecord::new(
            "cat.jpg".to_string(),
            "image/jpeg".to_string(),
            12345,
            "uuid-cat.jpg".to_string(),
            "https://example.com/uuid-cat.jpg".to_string(),
        );
        record.thumbnail_key = Some("uuid-cat_thumbnail.jpg".to_string());
        record.thumbnail_url = Some("https://example.com/uuid-cat_thumbnail.jpg".to_string());

        let response = AssetResponse::from(record.clone());
        assert_eq!(response.id, record.id);
        assert_eq!(response.filename, "cat.jpg");
        assert_eq!(response.url, "https://example.com/uuid-cat.jpg");
        assert_eq!(
            response.thumbnail_url.as_deref(),
            Some("https://example.com/uuid-cat_thumbnail.jpg")
        );
    }
}
