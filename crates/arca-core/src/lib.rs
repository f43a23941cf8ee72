//! Arca Core Library
//!
//! This crate provides core domain models, the key policy, error types, and
//! configuration that are shared across all Arca components.

pub mod config;
pub mod constants;
pub mod error;
pub mod keys;
pub mod models;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use storage_types::StorageBackend;
