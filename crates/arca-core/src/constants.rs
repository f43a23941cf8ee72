//! Application-wide constants.

use std::time::Duration;

/// Marker token inserted into a storage key to name the derived thumbnail.
pub const THUMBNAIL_MARKER: &str = "_thumbnail";

/// Validity window for presigned read URLs.
pub const SIGNED_URL_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Longest edge of a generated thumbnail, in pixels.
pub const THUMBNAIL_MAX_DIM: u32 = 300;
