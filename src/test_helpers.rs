//! Shared test utilities.
//!
//! Synthetic images with known properties, so tests never depend on binary
//! fixtures:
//!
//! - [`gradient_rgb`]: smooth ramps, low entropy per row, no alpha.
//! - [`noise_rgb`]: deterministic pseudo-random pixels, high spread and entropy.
//! - [`gradient_png`]: the gradient, PNG-encoded.

use image::{ImageFormat, RgbImage};
use std::io::Cursor;

use crate::imaging::RasterImage;

// =========================================================================
// Rasters
// =========================================================================

/// RGB gradient: red follows x, green follows y, blue is constant.
pub fn gradient_rgb(width: u32, height: u32) -> RasterImage {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.push(ramp(x, width));
            pixels.push(ramp(y, height));
            pixels.push(128);
        }
    }
    RasterImage::new(width, height, 3, pixels).unwrap()
}

/// RGB noise from a fixed-seed xorshift generator.
pub fn noise_rgb(width: u32, height: u32) -> RasterImage {
    let mut state: u32 = 0x9E37_79B9;
    let len = width as usize * height as usize * 3;
    let pixels = (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    RasterImage::new(width, height, 3, pixels).unwrap()
}

fn ramp(pos: u32, extent: u32) -> u8 {
    if extent <= 1 {
        0
    } else {
        (pos * 255 / (extent - 1)) as u8
    }
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// [`gradient_rgb`] encoded as PNG.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let raster = gradient_rgb(width, height);
    let img = RgbImage::from_raw(width, height, raster.pixels().to_vec()).unwrap();
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}
