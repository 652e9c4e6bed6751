//! Image payload handling.
//!
//! Images reach the service either as base64 strings in JSON bodies
//! (optionally wrapped in a `data:` URL) or as raw upload bytes. Both paths
//! end here so that size limits and format checks are applied the same way.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageReader;
use serde::Serialize;

use super::EmbeddingError;
use crate::types::{AppError, AppResult};

/// Basic facts about a decoded image, stored as row metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub color: String,
    pub size_bytes: usize,
}

/// Strip an optional `data:<mime>;base64,` prefix.
fn strip_data_url(encoded: &str) -> &str {
    match encoded.split_once(',') {
        Some((prefix, payload)) if prefix.starts_with("data:") || prefix.ends_with(";base64") => {
            payload
        }
        _ => encoded,
    }
}

/// Decode a base64 image string into raw bytes, enforcing `max_size`.
pub fn decode_base64_image(encoded: &str, max_size: usize) -> AppResult<Vec<u8>> {
    let payload: String = strip_data_url(encoded.trim())
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| EmbeddingError::InvalidImage(e.to_string()))?;

    validate_image_size(bytes.len(), max_size)?;
    inspect_image(&bytes)?;

    Ok(bytes)
}

pub fn validate_image_size(size: usize, max_size: usize) -> AppResult<()> {
    if size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "Image size {} exceeds maximum {}",
            size, max_size
        )));
    }
    Ok(())
}

/// Decode the image to make sure the encoder will accept it.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageInfo, EmbeddingError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| EmbeddingError::InvalidImage(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| EmbeddingError::InvalidImage("unrecognized image format".to_string()))?;

    let decoded = reader
        .decode()
        .map_err(|e| EmbeddingError::InvalidImage(e.to_string()))?;

    Ok(ImageInfo {
        width: decoded.width(),
        height: decoded.height(),
        format: format!("{:?}", format).to_uppercase(),
        color: format!("{:?}", decoded.color()),
        size_bytes: bytes.len(),
    })
}
