//! Base64 image payload handling shared by the job pipeline and the
//! collaborator clients.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

/// Decode a base64 image payload into raw bytes, verifying that the bytes
/// form a well-formed image. A leading `data:image/...;base64,` prefix is
/// accepted.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, ImageError> {
    let bytes = decode_base64_image(payload)?;
    verify_image(&bytes)?;
    Ok(bytes)
}

/// Base64-encode image bytes after checking that they form a recognised image.
pub fn encode_image_payload(bytes: &[u8]) -> Result<String, ImageError> {
    verify_image(bytes)?;
    Ok(STANDARD.encode(bytes))
}

/// Base64-decode a payload and check that its header names a known image
/// format. Pixel data is not decoded.
pub fn decode_base64_image(payload: &str) -> Result<Vec<u8>, ImageError> {
    let trimmed = payload.trim();
    let encoded = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };

    if encoded.is_empty() {
        return Err(ImageError::Empty);
    }

    let bytes = STANDARD.decode(encoded)?;
    sniff_format(&bytes)?;
    Ok(bytes)
}

/// Base64-encode bytes already known to be an image.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Image format named by the header of `bytes`.
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    image::guess_format(bytes).map_err(ImageError::UnknownFormat)
}

/// Check that `bytes` is a fully decodable image and return its format.
pub fn verify_image(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    let format = sniff_format(bytes)?;
    image::load_from_memory_with_format(bytes, format).map_err(ImageError::Malformed)?;
    Ok(format)
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image payload is empty")]
    Empty,

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unrecognised image format: {0}")]
    UnknownFormat(#[source] image::ImageError),

    #[error("malformed image data: {0}")]
    Malformed(#[source] image::ImageError),
}
