/// Avatar normalization
///
/// Uploaded pictures are decoded, cropped to a square from the centre, scaled
/// to 250x250 and re-encoded as PNG. Only the normalized bytes are stored, so
/// serving an avatar never needs to sniff a content type.

use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat};
use tracing::debug;

/// Edge length of a stored avatar in pixels
pub const AVATAR_SIZE: u32 = 250;

/// Error type for avatar processing
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error("Please upload an image")]
    Empty,

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Image task failed: {0}")]
    Internal(String),
}

fn accepted(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
    )
}

/// Turns an uploaded picture into a 250x250 PNG
///
/// The format is detected from the bytes, not from a file name or header.
pub fn transcode(bytes: &[u8]) -> Result<Vec<u8>, AvatarError> {
    if bytes.is_empty() {
        return Err(AvatarError::Empty);
    }

    let format = image::guess_format(bytes).map_err(|_| AvatarError::UnsupportedFormat)?;
    if !accepted(format) {
        return Err(AvatarError::UnsupportedFormat);
    }

    let source = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| AvatarError::Decode(e.to_string()))?;

    let resized = source.resize_to_fill(AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| AvatarError::Encode(e.to_string()))?;

    debug!(
        source_format = ?format,
        source_width = source.width(),
        source_height = source.height(),
        "Normalized avatar"
    );

    Ok(out.into_inner())
}

/// Runs [`transcode`] on the blocking pool
pub async fn normalize(bytes: Vec<u8>) -> Result<Vec<u8>, AvatarError> {
    tokio::task::spawn_blocking(move || transcode(&bytes))
        .await
        .map_err(|e| AvatarError::Internal(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 40, 90])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_transcode_png_to_square() {
        let png = transcode(&encode(640, 480, ImageFormat::Png)).unwrap();

        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (AVATAR_SIZE, AVATAR_SIZE));
    }

    #[test]
    fn test_transcode_jpeg_upscales() {
        let png = transcode(&encode(40, 90, ImageFormat::Jpeg)).unwrap();

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (AVATAR_SIZE, AVATAR_SIZE));
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(matches!(transcode(b""), Err(AvatarError::Empty)));
        assert!(matches!(
            transcode(b"%PDF-1.4 definitely not a picture"),
            Err(AvatarError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_rejects_truncated_image() {
        let png = encode(64, 64, ImageFormat::Png);
        assert!(matches!(
            transcode(&png[..png.len() / 3]),
            Err(AvatarError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_normalize_off_runtime() {
        let png = normalize(encode(300, 300, ImageFormat::Png)).await.unwrap();
        assert!(!png.is_empty());
    }
}
