//! Asset metadata persistence.
//!
//! The `AssetStore` trait is the repository seam between the HTTP/worker
//! layers and Postgres. `PgAssetStore` is the production implementation;
//! `MemoryAssetStore` backs integration tests that run without a database.

pub mod memory;
pub mod pg;
pub mod pool;
pub mod store;

pub use memory::MemoryAssetStore;
pub use pg::PgAssetStore;
pub use pool::setup_pool;
pub use store::AssetStore;
