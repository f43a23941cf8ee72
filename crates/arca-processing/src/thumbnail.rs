//! Thumbnail derivation.
//!
//! Reads a source image from disk, scales it to fit within a bounding box
//! while preserving aspect ratio, and writes the result next to it. The
//! output format follows the destination file extension, which by
//! construction matches the source's.

use image::imageops::FilterType;
use image::{GenericImageView, ImageReader};
use std::path::Path;
use thiserror::Error;

/// Thumbnail derivation errors
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode thumbnail: {0}")]
    Encode(String),
}

/// Pick a resize filter based on how aggressive the downscale is.
/// Large reductions tolerate cheaper filters without visible loss.
fn select_filter(src_dim: u32, dst_dim: u32) -> FilterType {
    let ratio = src_dim as f32 / dst_dim.max(1) as f32;
    if ratio > 2.0 {
        FilterType::Triangle
    } else if ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}

/// Generate a thumbnail bounded by `max_dim` on the longest edge.
///
/// Images already within bounds are re-encoded at their original size;
/// nothing is ever upscaled. Returns the thumbnail's dimensions.
pub fn generate_thumbnail(
    source: &Path,
    dest: &Path,
    max_dim: u32,
) -> Result<(u32, u32), ThumbnailError> {
    let start = std::time::Instant::now();

    let img = ImageReader::open(source)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| ThumbnailError::Decode(e.to_string()))?;

    let (width, height) = img.dimensions();
    let longest = width.max(height);

    let thumbnail = if longest > max_dim {
        let filter = select_filter(longest, max_dim);
        img.resize(max_dim, max_dim, filter)
    } else {
        img
    };

    let (out_width, out_height) = thumbnail.dimensions();

    thumbnail
        .save(dest)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;

    tracing::debug!(
        source = %source.display(),
        width = out_width,
        height = out_height,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "thumbnail generated"
    );

    Ok((out_width, out_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_downscales_to_bounding_box() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "wide.png", 900, 600);
        let dest = dir.path().join("wide_thumbnail.png");

        let (w, h) = generate_thumbnail(&source, &dest, 300).unwrap();
        assert_eq!((w, h), (300, 200));

        let reread = image::open(&dest).unwrap();
        assert_eq!(reread.dimensions(), (300, 200));
    }

    #[test]
    fn test_tall_image_bounded_by_height() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "tall.png", 150, 600);
        let dest = dir.path().join("tall_thumbnail.png");

        let (w, h) = generate_thumbnail(&source, &dest, 300).unwrap();
        assert_eq!(h, 300);
        assert_eq!(w, 75);
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "small.png", 120, 80);
        let dest = dir.path().join("small_thumbnail.png");

        let (w, h) = generate_thumbnail(&source, &dest, 300).unwrap();
        assert_eq!((w, h), (120, 80));
    }

    #[test]
    fn test_jpeg_output_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "photo.jpg", 640, 480);
        let dest = dir.path().join("photo_thumbnail.jpg");

        generate_thumbnail(&source, &dest, 300).unwrap();
        let format = ImageReader::open(&dest)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(format, Some(image::ImageFormat::Jpeg));
    }

    #[test]
    fn test_non_image_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("not_an_image.jpg");
        std::fs::write(&source, b"definitely not image bytes").unwrap();
        let dest = dir.path().join("not_an_image_thumbnail.jpg");

        let result = generate_thumbnail(&source, &dest, 300);
        assert!(matches!(result, Err(ThumbnailError::Decode(_))));
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate_thumbnail(
            &dir.path().join("missing.png"),
            &dir.path().join("out.png"),
            300,
        );
        assert!(matches!(result, Err(ThumbnailError::Io(_))));
    }
}
