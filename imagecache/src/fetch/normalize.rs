//! Image normalization.
//!
//! Fetched bodies are decoded and re-encoded as PNG so every stored entry
//! has the same pixel encoding regardless of what the server sent.

use std::io::Cursor;

use image::ImageFormat;

use super::types::FetchError;

/// Decode `data` (any supported format) and re-encode it as PNG.
///
/// Fails with [`FetchError::Decode`] when the bytes are not a decodable image.
pub fn normalize_to_png(data: &[u8]) -> Result<Vec<u8>, FetchError> {
    let image = image::load_from_memory(data).map_err(|e| FetchError::Decode(e.to_string()))?;

    let mut out = Cursor::new(Vec::with_capacity(data.len()));
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| FetchError::Decode(e.to_string()))?;

    Ok(out.into_inner())
}
