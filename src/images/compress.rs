use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView, ImageFormat,
};
use std::io::Cursor;
use tracing::{debug, warn};

use super::ImageError;

const MAX_ATTEMPTS: u32 = 10;
const QUALITY_START: f32 = 0.85;
const QUALITY_STEP: f32 = 0.05;
const QUALITY_FLOOR: f32 = 0.5;
const DIMENSION_FACTOR: f64 = 0.9;

/// Shrinks an image towards `budget_bytes` before it is persisted.
///
/// Inputs already under budget pass through untouched. Oversized inputs are
/// decoded once and re-encoded in a bounded loop: each attempt shrinks the
/// dimensions to 90 % of the previous attempt and, for JPEG, lowers the
/// quality factor by 0.05 (start 0.85, floor 0.5). If the budget is still
/// not met after [`MAX_ATTEMPTS`], the last encoding is returned anyway.
pub fn compress_to_budget(
    raw: &[u8],
    declared_content_type: Option<&str>,
    budget_bytes: usize,
) -> Result<Vec<u8>, ImageError> {
    if raw.len() <= budget_bytes {
        return Ok(raw.to_vec());
    }

    let format = format_from_content_type(declared_content_type);
    let decoded = image::load_from_memory(raw).map_err(ImageError::Decode)?;

    let original = decoded.dimensions();
    let (mut width, mut height) = original;
    let mut quality = QUALITY_START;
    let mut last = Vec::new();

    for attempt in 1..=MAX_ATTEMPTS {
        let frame = if (width, height) == original {
            decoded.clone()
        } else {
            decoded.resize_exact(width, height, FilterType::Triangle)
        };
        let encoded = encode(&frame, format, quality)?;
        debug!(
            attempt,
            width,
            height,
            quality,
            size = encoded.len(),
            "compression attempt"
        );
        if encoded.len() <= budget_bytes {
            return Ok(encoded);
        }

        width = ((f64::from(width) * DIMENSION_FACTOR) as u32).max(1);
        height = ((f64::from(height) * DIMENSION_FACTOR) as u32).max(1);
        if format == ImageFormat::Jpeg && quality > QUALITY_FLOOR {
            quality -= QUALITY_STEP;
        }
        last = encoded;
    }

    warn!(
        budget_bytes,
        size = last.len(),
        attempts = MAX_ATTEMPTS,
        "image still over budget, keeping best effort"
    );
    Ok(last)
}

fn format_from_content_type(content_type: Option<&str>) -> ImageFormat {
    match content_type {
        Some(ct) if ct.contains("png") => ImageFormat::Png,
        Some(ct) if ct.contains("jpeg") || ct.contains("jpg") => ImageFormat::Jpeg,
        Some(ct) if ct.contains("gif") => ImageFormat::Gif,
        Some(ct) if ct.contains("bmp") => ImageFormat::Bmp,
        Some(ct) if ct.contains("webp") => ImageFormat::WebP,
        _ => ImageFormat::Jpeg,
    }
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: f32) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    if format == ImageFormat::Jpeg {
        let encoder = JpegEncoder::new_with_quality(&mut cursor, (quality * 100.0).round() as u8);
        img.to_rgb8()
            .write_with_encoder(encoder)
            .map_err(ImageError::Encode)?;
    } else {
        img.write_to(&mut cursor, format).map_err(ImageError::Encode)?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    // Deterministic noise so JPEG cannot compress it away too easily.
    fn noisy_png(width: u32, height: u32) -> Vec<u8> {
        let mut seed = 0x2545_f491u32;
        let img = RgbImage::from_fn(width, height, |_, _| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let b = seed.to_be_bytes();
            Rgb([b[0], b[1], b[2]])
        });
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode test png");
        buf
    }

    #[test]
    fn under_budget_input_is_returned_unchanged() {
        let raw = noisy_png(32, 32);
        let out = compress_to_budget(&raw, Some("image/png"), raw.len() + 1).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn oversized_input_is_compressed_to_budget() {
        let raw = noisy_png(600, 600);
        let budget = 150 * 1024;
        assert!(raw.len() > budget, "test input must start over budget");

        let out = compress_to_budget(&raw, Some("image/jpeg"), budget).unwrap();
        assert!(out.len() <= budget, "got {} bytes", out.len());
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn unknown_content_type_defaults_to_jpeg() {
        let raw = noisy_png(600, 600);
        let out = compress_to_budget(&raw, None, 150 * 1024).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);

        let out = compress_to_budget(&raw, Some("application/octet-stream"), 150 * 1024).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn smaller_dimensions_and_quality_shrink_output() {
        let decoded = image::load_from_memory(&noisy_png(400, 400)).unwrap();
        let full = encode(&decoded, ImageFormat::Jpeg, QUALITY_START).unwrap();
        let reduced = encode(
            &decoded.resize_exact(360, 360, FilterType::Triangle),
            ImageFormat::Jpeg,
            QUALITY_START - QUALITY_STEP,
        )
        .unwrap();
        assert!(reduced.len() < full.len());
    }

    #[test]
    fn undecodable_oversized_input_fails() {
        let garbage = vec![0u8; 4096];
        match compress_to_budget(&garbage, Some("image/jpeg"), 16) {
            Err(ImageError::Decode(_)) => {}
            other => panic!("expected Decode error, got {other:?}"),
        }
    }
}
