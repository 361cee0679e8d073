//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Upscale factors the resampler accepts.
pub const UPSCALE_FACTORS: [u32; 2] = [2, 4];

/// Whether `scale` is one of the accepted upscale factors.
pub fn is_valid_scale(scale: u32) -> bool {
    UPSCALE_FACTORS.contains(&scale)
}

/// Calculate the output dimensions of an integer upscale.
///
/// # Arguments
/// * `original` - Source dimensions (width, height)
/// * `scale` - Integer scale factor
///
/// # Returns
/// * `Some((width, height))`, or `None` if either edge would overflow `u32`
///
/// # Examples
/// ```
/// # use pixkit::imaging::scaled_dimensions;
/// assert_eq!(scaled_dimensions((100, 100), 2), Some((200, 200)));
/// assert_eq!(scaled_dimensions((640, 480), 4), Some((2560, 1920)));
/// ```
pub fn scaled_dimensions(original: (u32, u32), scale: u32) -> Option<(u32, u32)> {
    let (w, h) = original;
    Some((w.checked_mul(scale)?, h.checked_mul(scale)?))
}
