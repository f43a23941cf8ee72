//! Application services.
//!
//! `AssetService` owns the upload, listing, and deletion flows, coordinating
//! the storage backend, the metadata store, and the processing channel.

pub mod assets;

pub use assets::AssetService;
