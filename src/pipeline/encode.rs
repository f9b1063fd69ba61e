//! Image encoding: `DynamicImage` → base64 JPEG wrapped in [`EncodedImage`].
//!
//! Completion APIs accept images as base64 data-URIs embedded in the JSON
//! request body. The photo is re-encoded as JPEG regardless of the upload
//! format: field photos are continuous-tone, where JPEG at quality 85 is a
//! fraction of the PNG size, and the request body rides inside typical
//! per-call upload limits even for large camera originals.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// JPEG re-encode quality.
const JPEG_QUALITY: u8 = 85;

/// A text-safe serialisation of a photo, ready for a JSON request body.
///
/// Transient: produced by [`encode_image`], consumed by the analysis call,
/// never retained.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Base64 of the JPEG re-encoding.
    pub data: String,
    /// Always `image/jpeg`; the re-encode normalises the upload format.
    pub mime_type: &'static str,
}

impl EncodedImage {
    /// Render as the `data:` URL form the chat-completions API expects.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Re-encode the photo as an in-memory JPEG and base64-wrap the bytes.
pub fn encode_image(img: &DynamicImage) -> Result<EncodedImage, image::ImageError> {
    let mut jpeg = Vec::new();
    // JpegEncoder cannot write alpha channels; flatten first.
    let rgb = img.to_rgb8();
    {
        let mut cursor = Cursor::new(&mut jpeg);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        rgb.write_with_encoder(encoder)?;
    }

    let data = STANDARD.encode(&jpeg);
    debug!("Encoded image → {} bytes base64", data.len());

    Ok(EncodedImage {
        data,
        mime_type: "image/jpeg",
    })
}
