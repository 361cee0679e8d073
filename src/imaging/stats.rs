//! Coarse image statistics.
//!
//! All functions here are pure and testable without any I/O.

use super::backend::BackendError;
use super::raster::RasterImage;

/// Per-channel spread and overall information content of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    /// Population standard deviation of each colour channel (R, G, B), 0–~128.
    pub std_dev: [f64; 3],
    /// Shannon entropy of the luma histogram in bits, 0–8.
    pub entropy: f64,
}

impl ChannelStats {
    /// Mean of the per-channel standard deviations.
    pub fn mean_std_dev(&self) -> f64 {
        self.std_dev.iter().sum::<f64>() / self.std_dev.len() as f64
    }
}

/// Compute [`ChannelStats`] over every pixel of `image`.
///
/// Alpha is ignored. Fails only for an empty image, where neither statistic
/// is defined.
pub fn compute_stats(image: &RasterImage) -> Result<ChannelStats, BackendError> {
    let n = image.pixel_count();
    if n == 0 {
        return Err(BackendError::ProcessingFailed(
            "cannot compute statistics of an empty image".into(),
        ));
    }

    let stride = image.channels() as usize;
    let mut sum = [0f64; 3];
    let mut sum_sq = [0f64; 3];
    let mut histogram = [0u64; 256];

    for px in image.pixels().chunks_exact(stride) {
        for c in 0..3 {
            let v = px[c] as f64;
            sum[c] += v;
            sum_sq[c] += v * v;
        }
        histogram[luma(px[0], px[1], px[2]) as usize] += 1;
    }

    let count = n as f64;
    let std_dev = std::array::from_fn(|c| {
        let mean = sum[c] / count;
        (sum_sq[c] / count - mean * mean).max(0.0).sqrt()
    });

    Ok(ChannelStats {
        std_dev,
        entropy: histogram_entropy(&histogram, count),
    })
}

/// BT.601 luma, rounded to the nearest 8-bit level.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u8
}

fn histogram_entropy(histogram: &[u64; 256], total: f64) -> f64 {
    histogram
        .iter()
        .filter(|&&h| h > 0)
        .map(|&h| {
            let p = h as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_rgb, noise_rgb};

    #[test]
    fn solid_image_has_zero_spread_and_entropy() {
        let img = RasterImage::filled(10, 10, [40, 80, 120, 255]);
        let stats = compute_stats(&img).unwrap();
        assert_eq!(stats.std_dev, [0.0, 0.0, 0.0]);
        assert_eq!(stats.entropy, 0.0);
    }

    #[test]
    fn two_level_image_has_one_bit_entropy() {
        // Half black, half white
        let mut pixels = vec![0u8; 4 * 3];
        pixels[6..].fill(255);
        let img = RasterImage::new(2, 2, 3, pixels).unwrap();
        let stats = compute_stats(&img).unwrap();
        assert!((stats.entropy - 1.0).abs() < 1e-9);
        assert!((stats.std_dev[0] - 127.5).abs() < 1e-9);
        assert!((stats.mean_std_dev() - 127.5).abs() < 1e-9);
    }

    #[test]
    fn noise_is_high_entropy() {
        let stats = compute_stats(&noise_rgb(128, 128)).unwrap();
        assert!(stats.entropy > 6.0, "entropy {}", stats.entropy);
        assert!(stats.mean_std_dev() > 25.0);
    }

    #[test]
    fn entropy_never_exceeds_eight_bits() {
        let stats = compute_stats(&gradient_rgb(256, 256)).unwrap();
        assert!(stats.entropy <= 8.0 + 1e-9);
    }

    #[test]
    fn alpha_channel_is_ignored() {
        let opaque = RasterImage::filled(4, 4, [10, 10, 10, 255]);
        let clear = RasterImage::filled(4, 4, [10, 10, 10, 0]);
        assert_eq!(compute_stats(&opaque).unwrap(), compute_stats(&clear).unwrap());
    }

    #[test]
    fn empty_image_errors() {
        let img = RasterImage::new(0, 0, 3, Vec::new()).unwrap();
        assert!(compute_stats(&img).is_err());
    }
}
