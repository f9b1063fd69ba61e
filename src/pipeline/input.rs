//! Image input: validate and decode a user-supplied photo.
//!
//! The upload surface restricts pickers to PNG/JPG/JPEG, but paths and
//! byte buffers arrive here unchecked. We sniff magic bytes before
//! handing the data to the decoder so callers get a typed
//! `UnsupportedImage` error with the offending bytes instead of a generic
//! decode failure for, say, a PDF renamed to `.jpg`.

use crate::error::ReportError;
use image::DynamicImage;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// PNG signature prefix.
const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];
/// JPEG SOI marker.
const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

fn looks_like_raster(magic: &[u8; 4]) -> bool {
    magic == &PNG_MAGIC || magic[..2] == JPEG_MAGIC
}

/// Load and decode the image at `path`.
///
/// Validates existence, readability, and magic bytes before decoding.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, ReportError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ReportError::ImageNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReportError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ReportError::ImageNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| ReportError::ImageDecode {
            detail: e.to_string(),
        })?;

    decode_bytes(&bytes, Some(path.to_path_buf()))
}

/// Decode an in-memory image buffer (e.g. an upload body).
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage, ReportError> {
    decode_bytes(bytes, None)
}

fn decode_bytes(bytes: &[u8], path: Option<PathBuf>) -> Result<DynamicImage, ReportError> {
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);

    if !looks_like_raster(&magic) {
        return Err(ReportError::UnsupportedImage {
            path: path.unwrap_or_else(|| PathBuf::from("<memory>")),
            magic,
        });
    }

    let img = image::load_from_memory(bytes).map_err(|e| ReportError::ImageDecode {
        detail: e.to_string(),
    })?;

    debug!("Decoded image: {}x{} px", img.width(), img.height());
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png_from_memory() {
        let img = load_image_from_bytes(&png_bytes()).unwrap();
        assert_eq!((img.width(), img.height()), (4, 4));
    }

    #[test]
    fn rejects_non_raster_bytes() {
        let err = load_image_from_bytes(b"%PDF-1.7 not an image").unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedImage { .. }));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let err = load_image_from_bytes(&[0xFF]).unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedImage { .. }));
    }

    #[test]
    fn jpeg_magic_with_garbage_body_is_a_decode_error() {
        let err = load_image_from_bytes(&[0xFF, 0xD8, 0x00, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, ReportError::ImageDecode { .. }));
    }

    #[test]
    fn missing_file_is_image_not_found() {
        let err = load_image("/definitely/not/a/real/photo.png").unwrap_err();
        assert!(matches!(err, ReportError::ImageNotFound { .. }));
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes()).unwrap();
        let img = load_image(&path).unwrap();
        assert_eq!((img.width(), img.height()), (4, 4));
    }
}
