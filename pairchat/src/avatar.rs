//! Profile image encoding.
//!
//! Images travel through the store as base64 strings on the user profile.
//! The cap keeps profile documents small; callers are expected to
//! downscale before encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use pairchat_proto::user::EncodedImage;

/// Maximum raw image size accepted for encoding (128 KB).
pub const MAX_IMAGE_BYTES: usize = 128 * 1024;

/// Errors raised by avatar encode/decode.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The raw image is empty.
    #[error("image data is empty")]
    Empty,
    /// The raw image exceeds [`MAX_IMAGE_BYTES`].
    #[error("image too large ({size} bytes, max {max} bytes)")]
    TooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },
    /// The encoded payload is not valid base64.
    #[error("invalid image encoding: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Encodes raw image bytes for storage on a profile.
///
/// # Errors
///
/// Returns [`ImageError::Empty`] or [`ImageError::TooLarge`].
pub fn encode(raw: &[u8]) -> Result<EncodedImage, ImageError> {
    if raw.is_empty() {
        return Err(ImageError::Empty);
    }
    if raw.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge {
            size: raw.len(),
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(EncodedImage::new(STANDARD.encode(raw)))
}

/// Decodes a stored profile image back to raw bytes.
///
/// # Errors
///
/// Returns [`ImageError::Decode`] if the payload is not valid base64.
pub fn decode(image: &EncodedImage) -> Result<Vec<u8>, ImageError> {
    Ok(STANDARD.decode(image.as_str())?)
}
