//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: decode, encode, and resize. Everything pixel-level beyond those
//! (statistics, masks, compositing) is done by this crate on [`RasterImage`]
//! buffers, so a backend is purely a codec + resampler.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Codec state lives only for the duration of a single call.

use super::params::{OutputFormat, Quality, ResizeParams};
use super::raster::RasterImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image codec backends.
///
/// Every backend must implement all three operations so the rest of the
/// codebase is backend-agnostic.
pub trait ImageBackend {
    /// Decode an encoded image (any supported container) into raw pixels.
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BackendError>;

    /// Encode raw pixels into the given container.
    fn encode(
        &self,
        image: &RasterImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;

    /// Resample to exact dimensions, optionally sharpening the result.
    fn resize(&self, image: &RasterImage, params: &ResizeParams)
    -> Result<RasterImage, BackendError>;
}
