//! Mask compositing.
//!
//! Destination-in blend: each output alpha is `min(source alpha, mask alpha)`
//! and colour channels pass through untouched. Images without alpha get an
//! opaque channel first, so the mask alone decides their transparency.

use crate::error::{Error, Result};
use crate::imaging::RasterImage;
use crate::mask::Mask;

/// Apply `mask` to `image`, returning an RGBA image of the same size.
///
/// Mask and image dimensions must match; a mismatch means the mask was built
/// for a different image and is reported as a processing error.
pub fn compose(image: RasterImage, mask: &Mask) -> Result<RasterImage> {
    if (image.width(), image.height()) != (mask.width(), mask.height()) {
        return Err(Error::Processing {
            stage: "compose",
            message: format!(
                "mask is {}x{} but image is {}x{}",
                mask.width(),
                mask.height(),
                image.width(),
                image.height()
            ),
        });
    }

    let mut rgba = image.ensure_alpha();
    for (px, &m) in rgba.pixels_mut().chunks_exact_mut(4).zip(mask.values()) {
        px[3] = px[3].min(m);
    }
    Ok(rgba)
}
