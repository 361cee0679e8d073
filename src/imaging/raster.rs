//! Decoded pixel buffers.
//!
//! [`RasterImage`] is the one in-memory image representation the crate passes
//! between the codec seam and the pixel heuristics. Pixels are always 8-bit,
//! interleaved, either RGB (3 channels) or RGBA (4 channels); decoders
//! normalise everything else into one of those two layouts.

use super::backend::BackendError;
use image::{DynamicImage, RgbImage, RgbaImage};

/// Background used when alpha has to be dropped.
pub const WHITE: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap raw interleaved pixels. `channels` must be 3 or 4 and the buffer
    /// length must match `width * height * channels`.
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self, BackendError> {
        if channels != 3 && channels != 4 {
            return Err(BackendError::ProcessingFailed(format!(
                "unsupported channel count {channels} (expected 3 or 4)"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(BackendError::ProcessingFailed(format!(
                "pixel buffer is {} bytes, expected {expected} for {width}x{height}x{channels}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    /// Solid-colour RGBA image, mostly useful for tests and placeholders.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            channels: 4,
            pixels,
        }
    }

    /// Normalise a decoded image: anything with alpha becomes RGBA8, the rest RGB8.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        if img.color().has_alpha() {
            Self {
                width,
                height,
                channels: 4,
                pixels: img.into_rgba8().into_raw(),
            }
        } else {
            Self {
                width,
                height,
                channels: 3,
                pixels: img.into_rgb8().into_raw(),
            }
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self.channels {
            4 => DynamicImage::ImageRgba8(
                RgbaImage::from_raw(self.width, self.height, self.pixels)
                    .expect("buffer length checked on construction"),
            ),
            _ => DynamicImage::ImageRgb8(
                RgbImage::from_raw(self.width, self.height, self.pixels)
                    .expect("buffer length checked on construction"),
            ),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Add a fully opaque alpha channel if the image has none.
    pub fn ensure_alpha(self) -> Self {
        if self.has_alpha() {
            return self;
        }
        let mut rgba = Vec::with_capacity(self.pixel_count() * 4);
        for px in self.pixels.chunks_exact(3) {
            rgba.extend_from_slice(px);
            rgba.push(255);
        }
        Self {
            width: self.width,
            height: self.height,
            channels: 4,
            pixels: rgba,
        }
    }

    /// Composite over a solid `background` and drop the alpha channel.
    pub fn flatten_onto(self, background: [u8; 3]) -> Self {
        if !self.has_alpha() {
            return self;
        }
        let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
        for px in self.pixels.chunks_exact(4) {
            let a = px[3] as u32;
            for (&c, &bg) in px[..3].iter().zip(&background) {
                rgb.push(((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            channels: 3,
            pixels: rgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_bad_channel_count() {
        assert!(RasterImage::new(1, 1, 2, vec![0, 0]).is_err());
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let err = RasterImage::new(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(err.to_string().contains("expected 12"));
    }

    #[test]
    fn ensure_alpha_appends_opaque_channel() {
        let rgb = RasterImage::new(2, 1, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let rgba = rgb.ensure_alpha();
        assert!(rgba.has_alpha());
        assert_eq!(rgba.pixels(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn ensure_alpha_is_noop_for_rgba() {
        let img = RasterImage::filled(3, 3, [10, 20, 30, 40]);
        assert_eq!(img.clone().ensure_alpha(), img);
    }

    #[test]
    fn flatten_blends_towards_background() {
        let mut img = RasterImage::filled(3, 1, [200, 0, 100, 255]);
        img.pixels_mut()[7] = 0;
        img.pixels_mut()[11] = 128;
        let flat = img.flatten_onto(WHITE);
        assert_eq!(flat.channels(), 3);
        assert_eq!(
            flat.pixels(),
            &[200, 0, 100, 255, 255, 255, 227, 127, 177]
        );
    }

    #[test]
    fn flatten_leaves_rgb_alone() {
        let rgb = RasterImage::new(1, 1, 3, vec![1, 2, 3]).unwrap();
        assert_eq!(rgb.clone().flatten_onto(WHITE), rgb);
    }

    #[test]
    fn from_dynamic_keeps_alpha_layout() {
        let gray_alpha = DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(4, 2));
        let raster = RasterImage::from_dynamic(gray_alpha);
        assert_eq!(raster.channels(), 4);
        assert_eq!(raster.pixels().len(), 4 * 2 * 4);

        let gray = DynamicImage::ImageLuma8(image::GrayImage::new(4, 2));
        assert_eq!(RasterImage::from_dynamic(gray).channels(), 3);
    }

    #[test]
    fn dynamic_round_trip_preserves_pixels() {
        let img = RasterImage::filled(5, 4, [9, 8, 7, 6]);
        let back = RasterImage::from_dynamic(img.clone().into_dynamic());
        assert_eq!(back, img);
    }
}
