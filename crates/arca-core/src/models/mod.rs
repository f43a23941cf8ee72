mod asset;
mod message;

pub use asset::{AssetListing, AssetRecord, AssetResponse};
pub use message::ProcessingRequest;
