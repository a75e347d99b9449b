use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

use super::ImageError;

/// Largest dimension sent to the vision model.
pub const MAX_DIMENSION: u32 = 512;

const ACCEPTED_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::WebP,
];

/// Turns raw image bytes into a transport-ready `data:image/jpeg;base64,…`
/// payload: sniff the format from the bytes, decode, downscale so the larger
/// dimension is at most [`MAX_DIMENSION`], flatten any alpha onto white and
/// re-encode as JPEG.
pub fn prepare(raw: &[u8]) -> Result<String, ImageError> {
    let format = image::guess_format(raw).map_err(|_| ImageError::UnknownFormat)?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(ImageError::UnsupportedFormat(format!("{format:?}")));
    }

    let decoded = image::load_from_memory_with_format(raw, format).map_err(ImageError::Decode)?;
    let (width, height) = decoded.dimensions();

    let bounded = if width <= MAX_DIMENSION && height <= MAX_DIMENSION {
        decoded
    } else {
        let scale = f64::from(MAX_DIMENSION) / f64::from(width.max(height));
        let new_width = ((f64::from(width) * scale) as u32).max(1);
        let new_height = ((f64::from(height) * scale) as u32).max(1);
        debug!(width, height, new_width, new_height, "downscaling image");
        decoded.resize_exact(new_width, new_height, FilterType::Triangle)
    };

    let flattened = flatten_alpha(&bounded);

    let mut jpeg = Vec::new();
    flattened
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .map_err(ImageError::Encode)?;

    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg)))
}

/// JPEG has no alpha channel; composite transparent sources onto white.
fn flatten_alpha(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = u32::from(px[3]);
        let over = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([over(px[0]), over(px[1]), over(px[2])]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode test png");
        buf
    }

    fn decode_payload(data_uri: &str) -> Vec<u8> {
        let payload = data_uri
            .strip_prefix(DATA_URI_PREFIX)
            .expect("data uri prefix");
        BASE64.decode(payload).expect("valid base64 payload")
    }

    #[test]
    fn large_image_is_downscaled_to_bound() {
        let out = prepare(&png_bytes(1024, 768)).expect("prepare should succeed");
        assert!(out.starts_with(DATA_URI_PREFIX));

        let jpeg = decode_payload(&out);
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (512, 384));
    }

    #[test]
    fn small_image_keeps_dimensions() {
        let out = prepare(&png_bytes(100, 50)).expect("prepare should succeed");
        let decoded = image::load_from_memory(&decode_payload(&out)).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn portrait_scales_on_height() {
        let out = prepare(&png_bytes(300, 1024)).expect("prepare should succeed");
        let decoded = image::load_from_memory(&decode_payload(&out)).unwrap();
        // floor(300 * 512/1024) x 512
        assert_eq!(decoded.dimensions(), (150, 512));
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();

        let out = prepare(&buf).expect("prepare should succeed");
        let decoded = image::load_from_memory(&decode_payload(&out)).unwrap();
        let px = decoded.to_rgb8().get_pixel(32, 32).0;
        // JPEG is lossy, so allow a small tolerance around pure white.
        assert!(px.iter().all(|&c| c > 240), "expected near-white, got {px:?}");
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let img = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let mut tiff = Vec::new();
        img.write_to(&mut Cursor::new(&mut tiff), ImageFormat::Tiff)
            .unwrap();

        match prepare(&tiff) {
            Err(ImageError::UnsupportedFormat(_)) => {}
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn undetectable_bytes_are_rejected() {
        match prepare(b"definitely not an image") {
            Err(ImageError::UnknownFormat) => {}
            other => panic!("expected UnknownFormat, got {other:?}"),
        }
    }

    #[test]
    fn same_input_same_output() {
        let raw = png_bytes(640, 480);
        assert_eq!(prepare(&raw).unwrap(), prepare(&raw).unwrap());
    }
}
