//! Image codec seam — pure Rust, zero system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from bytes) |
//! | **Resize** | `imageops::resize` + `unsharpen` |
//! | **Encode** | JPEG / PNG / AVIF encoders from `image`, lossy WebP from `webp` |
//! | **Statistics** | per-channel std-dev + luma entropy, computed here |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Raster**: The decoded pixel buffer passed around the crate
//! - **Stats**: Channel statistics feeding the quality estimator
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
mod raster;
pub mod rust_backend;
mod stats;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{UPSCALE_FACTORS, is_valid_scale, scaled_dimensions};
pub use params::{
    OUTPUT_FORMAT_NAMES, OutputFormat, Quality, ResampleFilter, ResizeParams, Sharpening,
    UnknownFormat,
};
pub use raster::RasterImage;
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use stats::{ChannelStats, compute_stats};
