pub mod compress;
pub mod prepare;

use thiserror::Error;

/// Failures while decoding or re-encoding image bytes. Deterministic for a
/// given input, so callers must not retry.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unable to detect image format")]
    UnknownFormat,
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}
