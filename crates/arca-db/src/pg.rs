//! Postgres-backed asset repository.

use arca_core::models::AssetRecord;
use arca_core::AppError;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::store::AssetStore;

const SELECT_COLUMNS: &str = "id, filename, content_type, size, storage_key, storage_url, \
                              thumbnail_key, thumbnail_url, uploaded_at, last_modified";

/// Repository for the assets table.
#[derive(Clone)]
pub struct PgAssetStore {
    pool: PgPool,
}

impl PgAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetStore for PgAssetStore {
    #[tracing::instrument(skip(self, record), fields(db.table = "assets", key = %record.storage_key))]
    async fn insert(&self, record: &AssetRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO assets (id, filename, content_type, size, storage_key, storage_url,
                                thumbnail_key, thumbnail_url, uploaded_at, last_modified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(&record.filename)
        .bind(&record.content_type)
        .bind(record.size)
        .bind(&record.storage_key)
        .bind(&record.storage_url)
        .bind(&record.thumbnail_key)
        .bind(&record.thumbnail_url)
        .bind(record.uploaded_at)
        .bind(record.last_modified)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<AssetRecord>, AppError> {
        let row: Option<AssetRecord> = sqlx::query_as::<Postgres, AssetRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM assets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", key = %storage_key))]
    async fn find_by_storage_key(
        &self,
        storage_key: &str,
    ) -> Result<Option<AssetRecord>, AppError> {
        let row: Option<AssetRecord> = sqlx::query_as::<Postgres, AssetRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM assets WHERE storage_key = $1"
        ))
        .bind(storage_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", key = %storage_key))]
    async fn set_thumbnail(
        &self,
        storage_key: &str,
        thumbnail_key: &str,
        thumbnail_url: &str,
    ) -> Result<Option<AssetRecord>, AppError> {
        let row: Option<AssetRecord> = sqlx::query_as::<Postgres, AssetRecord>(&format!(
            r#"
            UPDATE assets
            SET thumbnail_key = $2, thumbnail_url = $3, last_modified = NOW()
            WHERE storage_key = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(storage_key)
        .bind(thumbnail_key)
        .bind(thumbnail_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", key = %storage_key))]
    async fn delete_by_storage_key(&self, storage_key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM assets WHERE storage_key = $1")
            .bind(storage_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets"))]
    async fn list(&self) -> Result<Vec<AssetRecord>, AppError> {
        let rows: Vec<AssetRecord> = sqlx::query_as::<Postgres, AssetRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM assets ORDER BY uploaded_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
