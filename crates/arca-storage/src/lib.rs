//! Arca Storage Library
//!
//! Storage abstraction and backend implementations. The `Storage` trait is
//! the only surface the rest of the system sees; a single concrete backend is
//! selected at process start via `factory::create_storage` and injected once.
//!
//! # Storage keys
//!
//! Keys are flat `{uuid}-{filename}` strings minted by `arca_core::keys` and
//! must not contain `..` or a leading `/`. Thumbnail objects live next to
//! their originals under the marker-derived key.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use arca_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageObject, StorageResult};
