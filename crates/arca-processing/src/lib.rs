//! Image derivation for the thumbnail worker.

pub mod filename;
pub mod thumbnail;

pub use filename::sanitize_filename;
pub use thumbnail::{generate_thumbnail, ThumbnailError};
