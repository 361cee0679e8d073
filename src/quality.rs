//! Compression quality heuristic.
//!
//! Picks an encoder quality from coarse image statistics instead of running a
//! perceptual search. The rules, applied in order:
//!
//! | Step | Rule |
//! |------|------|
//! | Lossless target | PNG short-circuits: 100 with alpha, 95 without |
//! | Base | 85 for photographic content, 92 for graphics |
//! | Complexity | > 0.8 → +8, < 0.3 → −12 |
//! | File size | > 2 MiB → −5, < 100 KiB → +5 |
//! | Format | WebP +5, AVIF +10, JPEG ±0 |
//! | Clamp | [50, 95], rounded |
//!
//! "Photographic" means mean channel std-dev above 25 *and* luma entropy
//! above 6 bits.

use crate::imaging::{ChannelStats, OutputFormat};
use serde::Serialize;

/// Quality used when statistics cannot be computed.
pub const FALLBACK_QUALITY: u32 = 80;

pub const MIN_QUALITY: u32 = 50;
pub const MAX_QUALITY: u32 = 95;

const LARGE_FILE_BYTES: u64 = 2 * 1024 * 1024;
const SMALL_FILE_BYTES: u64 = 100 * 1024;

/// Outcome of analysing one image for compression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityReport {
    pub is_photographic: bool,
    /// Blend of colour spread and entropy, 0 (flat) to 1 (busy).
    pub complexity_score: f64,
    pub recommended_quality: u32,
}

/// Full analysis, keeping the intermediate classification for reporting.
pub fn analyze(
    stats: &ChannelStats,
    has_alpha: bool,
    file_size_bytes: u64,
    target: OutputFormat,
) -> QualityReport {
    let avg_std_dev = stats.mean_std_dev();
    let is_photographic = avg_std_dev > 25.0 && stats.entropy > 6.0;
    let complexity_score =
        (0.7 * (avg_std_dev / 100.0) + 0.3 * (stats.entropy / 8.0)).clamp(0.0, 1.0);

    if target.is_lossless() {
        return QualityReport {
            is_photographic,
            complexity_score,
            recommended_quality: if has_alpha { 100 } else { 95 },
        };
    }

    let mut quality: f64 = if is_photographic { 85.0 } else { 92.0 };

    if complexity_score > 0.8 {
        quality += 8.0;
    } else if complexity_score < 0.3 {
        quality -= 12.0;
    }

    if file_size_bytes > LARGE_FILE_BYTES {
        quality -= 5.0;
    } else if file_size_bytes < SMALL_FILE_BYTES {
        quality += 5.0;
    }

    quality += match target {
        OutputFormat::Webp => 5.0,
        OutputFormat::Avif => 10.0,
        OutputFormat::Jpeg | OutputFormat::Png => 0.0,
    };

    QualityReport {
        is_photographic,
        complexity_score,
        recommended_quality: quality
            .clamp(MIN_QUALITY as f64, MAX_QUALITY as f64)
            .round() as u32,
    }
}

/// Recommended encoder quality for `target`.
pub fn estimate(
    stats: &ChannelStats,
    has_alpha: bool,
    file_size_bytes: u64,
    target: OutputFormat,
) -> u32 {
    analyze(stats, has_alpha, file_size_bytes, target).recommended_quality
}
