//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::with_guessed_format` + `into_dimensions` |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP, BMP) | `image::load_from_memory` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//!
//! JPEG has no alpha channel, so images are flattened to RGB8 before
//! encoding. Transparent pixels keep their stored color channels.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes)
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {e}")))
}

/// Encode as baseline JPEG at the given quality.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {e}"))
            })?;
        Ok(Dimensions { width, height })
    }

    fn downscale(&self, bytes: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        let img = decode(bytes)?;
        let resized = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        encode_jpeg(&resized, params.quality.value())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{ImageFormat, RgbImage, RgbaImage};

    /// Encode a synthetic gradient in the given format.
    pub(crate) fn synthetic_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, format)
            .unwrap();
        out.into_inner()
    }

    fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn identify_synthetic_png() {
        let bytes = synthetic_image(200, 150, ImageFormat::Png);
        let dims = RustBackend::new().identify(&bytes).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_garbage_errors() {
        let result = RustBackend::new().identify(b"definitely not an image");
        assert!(result.is_err());
    }

    #[test]
    fn downscale_png_to_jpeg() {
        let bytes = synthetic_image(400, 200, ImageFormat::Png);
        let out = RustBackend::new()
            .downscale(
                &bytes,
                &ResizeParams {
                    width: 200,
                    height: 100,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        assert_eq!(decoded_dimensions(&out), (200, 100));
    }

    #[test]
    fn downscale_same_size_reencodes() {
        let bytes = synthetic_image(64, 48, ImageFormat::Png);
        let out = RustBackend::new()
            .downscale(
                &bytes,
                &ResizeParams {
                    width: 64,
                    height: 48,
                    quality: Quality::new(90),
                },
            )
            .unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        assert_eq!(decoded_dimensions(&out), (64, 48));
    }

    #[test]
    fn downscale_flattens_alpha() {
        let img = RgbaImage::from_pixel(32, 32, image::Rgba([10, 20, 30, 0]));
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();

        let out = RustBackend::new()
            .downscale(
                png.get_ref(),
                &ResizeParams {
                    width: 16,
                    height: 16,
                    quality: Quality::new(80),
                },
            )
            .unwrap();
        assert_eq!(decoded_dimensions(&out), (16, 16));
    }

    #[test]
    fn downscale_garbage_errors() {
        let result = RustBackend::new().downscale(
            b"GIF89a truncated",
            &ResizeParams {
                width: 10,
                height: 10,
                quality: Quality::default(),
            },
        );
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn lower_quality_produces_smaller_output() {
        let bytes = synthetic_image(300, 300, ImageFormat::Png);
        let backend = RustBackend::new();
        let params = |q| ResizeParams {
            width: 300,
            height: 300,
            quality: Quality::new(q),
        };
        let high = backend.downscale(&bytes, &params(95)).unwrap();
        let low = backend.downscale(&bytes, &params(10)).unwrap();
        assert!(low.len() < high.len());
    }
}
