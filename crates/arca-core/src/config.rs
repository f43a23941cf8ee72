//! Configuration module
//!
//! Environment-driven configuration shared by the API and worker binaries.
//! Exactly one storage backend and one queue driver are selected at process
//! start; neither is switched at runtime.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_WORKER_CONCURRENCY: usize = 4;
const DEFAULT_MAX_METADATA_ATTEMPTS: u32 = 5;
const DEFAULT_RECEIVE_WAIT_SECONDS: i32 = 10;
const DEFAULT_QUEUE_PREFIX: &str = "arca-processing";

/// Message-channel driver selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDriver {
    Sqs,
    Memory,
}

impl FromStr for QueueDriver {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqs" => Ok(QueueDriver::Sqs),
            "memory" => Ok(QueueDriver::Memory),
            _ => Err(anyhow::anyhow!("Invalid queue driver: {}", s)),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub server_port: u16,
    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    // Storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Queue
    pub queue_driver: QueueDriver,
    pub queue_prefix: String,
    pub queue_region: Option<String>,
    pub queue_endpoint: Option<String>,
    pub receive_wait_seconds: i32,
    // Worker
    pub worker_concurrency: usize,
    pub worker_max_metadata_attempts: u32,
    // Upload limits
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let queue_driver = env::var("QUEUE_DRIVER")
            .unwrap_or_else(|_| "sqs".to_string())
            .parse::<QueueDriver>()?;

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB);

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| "image/jpeg,image/png,image/gif,image/webp".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let config = Config {
            environment,
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_DB_MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or(env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            queue_driver,
            queue_prefix: env::var("QUEUE_PREFIX")
                .unwrap_or_else(|_| DEFAULT_QUEUE_PREFIX.to_string()),
            queue_region: env::var("QUEUE_REGION").ok().or(env::var("AWS_REGION").ok()),
            queue_endpoint: env::var("QUEUE_ENDPOINT").ok(),
            receive_wait_seconds: env::var("QUEUE_RECEIVE_WAIT_SECONDS")
                .unwrap_or_else(|_| DEFAULT_RECEIVE_WAIT_SECONDS.to_string())
                .parse()
                .unwrap_or(DEFAULT_RECEIVE_WAIT_SECONDS),
            worker_concurrency: env::var("WORKER_CONCURRENCY")
                .unwrap_or_else(|_| DEFAULT_WORKER_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(DEFAULT_WORKER_CONCURRENCY),
            worker_max_metadata_attempts: env::var("WORKER_MAX_METADATA_ATTEMPTS")
                .unwrap_or_else(|_| DEFAULT_MAX_METADATA_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_METADATA_ATTEMPTS),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_content_types,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations missing backend-specific settings up front
    /// rather than failing on the first request.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
                }
                if self.s3_region.is_none() {
                    anyhow::bail!("S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3");
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    anyhow::bail!("LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local");
                }
                if self.local_storage_base_url.is_none() {
                    anyhow::bail!("LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local");
                }
            }
            StorageBackend::Memory => {}
        }

        if self.queue_driver == QueueDriver::Sqs && self.queue_region.is_none() {
            anyhow::bail!("QUEUE_REGION or AWS_REGION must be set when QUEUE_DRIVER=sqs");
        }

        if self.worker_concurrency == 0 {
            anyhow::bail!("WORKER_CONCURRENCY must be at least 1");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            environment: "test".to_string(),
            server_port: 4000,
            database_url: "postgres://localhost/arca".to_string(),
            db_max_connections: 20,
            storage_backend: StorageBackend::Memory,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
            local_storage_base_url: None,
            queue_driver: QueueDriver::Memory,
            queue_prefix: "arca-processing".to_string(),
            queue_region: None,
            queue_endpoint: None,
            receive_wait_seconds: 10,
            worker_concurrency: 4,
            worker_max_metadata_attempts: 5,
            max_file_size_bytes: 10 * 1024 * 1024,
            allowed_content_types: vec!["image/jpeg".to_string()],
        }
    }

    #[test]
    fn test_validate_s3_requires_bucket() {
        let mut config = base_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("assets".to_string());
        config.s3_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_local_requires_path() {
        let mut config = base_config();
        config.storage_backend = StorageBackend::Local;
        assert!(config.validate().is_err());

        config.local_storage_path = Some("/var/lib/arca".to_string());
        config.local_storage_base_url = Some("http://localhost:4000/media".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = base_config();
        config.worker_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
