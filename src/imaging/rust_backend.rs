//! Pure Rust codec backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::ImageReader` with format sniffing |
//! | Resize | `image::imageops::resize` with the configured kernel |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality`, alpha composited onto white |
//! | Encode → PNG | `PngEncoder` (best compression, adaptive filter) |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy at the requested quality) |
//! | Encode → AVIF | `AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, ImageBackend};
use super::params::{OutputFormat, Quality, ResampleFilter, ResizeParams};
use super::raster::{RasterImage, WHITE};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
    ("tiff", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
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

fn filter_type(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Triangle => FilterType::Triangle,
        ResampleFilter::CatmullRom => FilterType::CatmullRom,
        ResampleFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

fn encode_failed(format: OutputFormat, e: impl std::fmt::Display) -> BackendError {
    BackendError::ProcessingFailed(format!("{format} encode failed: {e}"))
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BackendError> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {e}")))?;
        Ok(RasterImage::from_dynamic(img))
    }

    fn encode(
        &self,
        image: &RasterImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let mut out = Vec::new();
        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha: transparent areas come out white.
                let rgb = image.clone().flatten_onto(WHITE).into_dynamic();
                let encoder = JpegEncoder::new_with_quality(&mut out, quality.value() as u8);
                rgb.write_with_encoder(encoder)
                    .map_err(|e| encode_failed(format, e))?;
            }
            OutputFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut out,
                    CompressionType::Best,
                    PngFilter::Adaptive,
                );
                image
                    .clone()
                    .into_dynamic()
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_failed(format, e))?;
            }
            OutputFormat::Webp => {
                let (w, h) = (image.width(), image.height());
                let encoder = if image.has_alpha() {
                    webp::Encoder::from_rgba(image.pixels(), w, h)
                } else {
                    webp::Encoder::from_rgb(image.pixels(), w, h)
                };
                let encoded = encoder
                    .encode_simple(false, quality.value() as f32)
                    .map_err(|e| encode_failed(format, format!("{e:?}")))?;
                out.extend_from_slice(&encoded);
            }
            OutputFormat::Avif => {
                let encoder =
                    AvifEncoder::new_with_speed_quality(&mut out, 6, quality.value() as u8);
                image
                    .clone()
                    .into_dynamic()
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_failed(format, e))?;
            }
        }
        Ok(out)
    }

    fn resize(
        &self,
        image: &RasterImage,
        params: &ResizeParams,
    ) -> Result<RasterImage, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "invalid resize target {}x{}",
                params.width, params.height
            )));
        }
        let img = image.clone().into_dynamic();
        let resized = img.resize_exact(params.width, params.height, filter_type(params.filter));

        let final_img = if let Some(sharpening) = params.sharpening {
            resized.unsharpen(sharpening.sigma, sharpening.threshold)
        } else {
            resized
        };

        Ok(RasterImage::from_dynamic(final_img))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Sharpening;
    use crate::test_helpers::{gradient_png, gradient_rgb, noise_rgb};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "webp", "tiff", "bmp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn decode_synthetic_png() {
        let backend = RustBackend::new();
        let raster = backend.decode(&gradient_png(64, 48)).unwrap();
        assert_eq!(raster.width(), 64);
        assert_eq!(raster.height(), 48);
        assert!(!raster.has_alpha());
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.decode(b"definitely not an image").is_err());
    }

    #[test]
    fn encode_every_format_produces_decodable_bytes_where_supported() {
        let backend = RustBackend::new();
        let raster = gradient_rgb(32, 24);

        for format in [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::Webp] {
            let bytes = backend.encode(&raster, format, Quality::new(80)).unwrap();
            let back = backend.decode(&bytes).unwrap();
            assert_eq!((back.width(), back.height()), (32, 24), "{format}");
        }

        let avif = backend
            .encode(&raster, OutputFormat::Avif, Quality::new(60))
            .unwrap();
        assert!(!avif.is_empty());
    }

    #[test]
    fn jpeg_encode_flattens_alpha() {
        let backend = RustBackend::new();
        let rgba = gradient_rgb(16, 16).ensure_alpha();
        let bytes = backend
            .encode(&rgba, OutputFormat::Jpeg, Quality::new(90))
            .unwrap();
        assert!(!backend.decode(&bytes).unwrap().has_alpha());
    }

    #[test]
    fn jpeg_composites_transparency_onto_white() {
        let backend = RustBackend::new();
        let clear_red = RasterImage::filled(16, 16, [255, 0, 0, 0]);
        let bytes = backend
            .encode(&clear_red, OutputFormat::Jpeg, Quality::new(95))
            .unwrap();
        let back = backend.decode(&bytes).unwrap();
        for &v in &back.pixels()[..3] {
            assert!(v > 245, "expected white, got {:?}", &back.pixels()[..3]);
        }
    }

    #[test]
    fn webp_size_follows_quality() {
        let backend = RustBackend::new();
        let raster = noise_rgb(128, 128);
        let low = backend
            .encode(&raster, OutputFormat::Webp, Quality::new(10))
            .unwrap();
        let high = backend
            .encode(&raster, OutputFormat::Webp, Quality::new(90))
            .unwrap();
        assert_ne!(low, high);
        assert!(
            low.len() < high.len(),
            "q10 gave {} bytes, q90 gave {}",
            low.len(),
            high.len()
        );
    }

    #[test]
    fn webp_keeps_alpha() {
        let backend = RustBackend::new();
        let mut rgba = RasterImage::filled(16, 16, [0, 0, 255, 255]);
        for px in rgba.pixels_mut().chunks_exact_mut(4).take(16) {
            px[3] = 0;
        }
        let bytes = backend
            .encode(&rgba, OutputFormat::Webp, Quality::new(75))
            .unwrap();
        let back = backend.decode(&bytes).unwrap();
        assert!(back.has_alpha());
        assert_eq!(back.pixels()[3], 0);
        assert_eq!(back.pixels()[back.pixels().len() - 1], 255);
    }

    #[test]
    fn png_keeps_alpha() {
        let backend = RustBackend::new();
        let rgba = RasterImage::filled(8, 8, [255, 0, 0, 128]);
        let bytes = backend
            .encode(&rgba, OutputFormat::Png, Quality::default())
            .unwrap();
        let back = backend.decode(&bytes).unwrap();
        assert!(back.has_alpha());
        assert_eq!(&back.pixels()[..4], &[255, 0, 0, 128]);
    }

    #[test]
    fn resize_to_exact_dimensions_with_sharpening() {
        let backend = RustBackend::new();
        let out = backend
            .resize(
                &gradient_rgb(50, 30),
                &ResizeParams {
                    width: 100,
                    height: 60,
                    filter: ResampleFilter::Lanczos3,
                    sharpening: Some(Sharpening::upscale()),
                },
            )
            .unwrap();
        assert_eq!((out.width(), out.height()), (100, 60));
    }

    #[test]
    fn resize_to_zero_errors() {
        let backend = RustBackend::new();
        let result = backend.resize(
            &gradient_rgb(4, 4),
            &ResizeParams {
                width: 0,
                height: 4,
                filter: ResampleFilter::Nearest,
                sharpening: None,
            },
        );
        assert!(result.is_err());
    }
}
