//! Key policy shared by the upload path and the processing worker.
//!
//! Both sides of the queue must agree on how thumbnail keys are derived from
//! original keys, so all key math is centralized here. Every function except
//! `derive_key` is pure and deterministic.

use uuid::Uuid;

use crate::constants::THUMBNAIL_MARKER;

/// Mint a fresh storage key for an uploaded file.
///
/// The random prefix makes keys unique across uploads of the same filename
/// and guarantees a deleted key is never reused.
pub fn derive_key(filename: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), filename)
}

/// Compute the thumbnail key for an original key.
///
/// The marker is inserted before the last `.`-delimited extension; keys
/// without an extension (or with only a leading dot) get the marker appended.
pub fn thumbnail_key(original_key: &str) -> String {
    match original_key.rfind('.') {
        Some(dot) if dot > 0 => format!(
            "{}{}{}",
            &original_key[..dot],
            THUMBNAIL_MARKER,
            &original_key[dot..]
        ),
        _ => format!("{}{}", original_key, THUMBNAIL_MARKER),
    }
}

/// Recover the original key from a thumbnail key.
///
/// Strips the last occurrence of the marker so that a marker appearing
/// earlier in the filename is left alone, mirroring the insertion rule.
/// Keys without the marker are returned unchanged.
pub fn original_key(thumbnail_key: &str) -> String {
    match thumbnail_key.rfind(THUMBNAIL_MARKER) {
        Some(idx) => {
            let mut key = String::with_capacity(thumbnail_key.len() - THUMBNAIL_MARKER.len());
            key.push_str(&thumbnail_key[..idx]);
            key.push_str(&thumbnail_key[idx + THUMBNAIL_MARKER.len()..]);
            key
        }
        None => thumbnail_key.to_string(),
    }
}

/// Whether a key names a thumbnail object rather than an original.
pub fn is_thumbnail_key(key: &str) -> bool {
    original_key(key) != key
}

/// Extract the display filename from a storage key (portion after the last `/`).
pub fn display_filename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_embeds_filename() {
        let key = derive_key("cat.jpg");
        assert!(key.ends_with("-cat.jpg"));
        // uuid prefix is 36 chars plus the separator
        assert_eq!(key.len(), 36 + 1 + "cat.jpg".len());
    }

    #[test]
    fn test_derive_key_unique() {
        assert_ne!(derive_key("cat.jpg"), derive_key("cat.jpg"));
    }

    #[test]
    fn test_thumbnail_key_with_extension() {
        assert_eq!(thumbnail_key("abc-cat.jpg"), "abc-cat_thumbnail.jpg");
    }

    #[test]
    fn test_thumbnail_key_multiple_dots() {
        assert_eq!(
            thumbnail_key("abc-archive.tar.gz"),
            "abc-archive.tar_thumbnail.gz"
        );
    }

    #[test]
    fn test_thumbnail_key_without_extension() {
        assert_eq!(thumbnail_key("abc-cat"), "abc-cat_thumbnail");
    }

    #[test]
    fn test_thumbnail_key_leading_dot_only() {
        assert_eq!(thumbnail_key(".bashrc"), ".bashrc_thumbnail");
    }

    #[test]
    fn test_original_key_round_trip() {
        for key in ["abc-cat.jpg", "abc-cat", "a.b.c", ".bashrc", "x-1.png"] {
            assert_eq!(original_key(&thumbnail_key(key)), key);
        }
    }

    #[test]
    fn test_original_key_targets_last_marker() {
        // The filename itself contains the marker; only the inserted one is removed.
        let key = "abc-cat_thumbnail.jpg";
        assert_eq!(
            thumbnail_key(key),
            "abc-cat_thumbnail_thumbnail.jpg"
        );
        assert_eq!(original_key(&thumbnail_key(key)), key);
    }

    #[test]
    fn test_original_key_identity_without_marker() {
        assert_eq!(original_key("abc-cat.jpg"), "abc-cat.jpg");
    }

    #[test]
    fn test_round_trip_through_derive_key() {
        let key = derive_key("photo.png");
        assert_eq!(original_key(&thumbnail_key(&key)), key);
    }

    #[test]
    fn test_is_thumbnail_key() {
        assert!(is_thumbnail_key("abc-cat_thumbnail.jpg"));
        assert!(!is_thumbnail_key("abc-cat.jpg"));
    }

    #[test]
    fn test_display_filename() {
        assert_eq!(display_filename("media/abc-cat.jpg"), "abc-cat.jpg");
        assert_eq!(display_filename("abc-cat.jpg"), "abc-cat.jpg");
    }
}
