//! # pixkit
//!
//! Local image processing with no network and no models: background removal
//! by geometric mask, 2×/4× upscaling, quality-estimating compression, and
//! `enhance`, which chains the three.
//!
//! # Architecture
//!
//! ```text
//! input (path | bytes) ──▶ validate ──▶ decode ──▶ transform ──▶ encode ──▶ bytes
//!                                         ▲                        │
//!                                         └──── ImageBackend ──────┘
//! ```
//!
//! Pixel work that is specific to this tool (statistics, masks, compositing)
//! operates on plain [`imaging::RasterImage`] buffers. Only decode, encode and
//! resample go through the [`imaging::ImageBackend`] trait, so tests can swap
//! in a recording mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`processor`] | The four entry points: compress, upscale, remove background, enhance |
//! | [`pipeline`] | `Stage` enum, task-name parsing, and the sequential `Sequencer` |
//! | [`quality`] | Quality heuristic from channel statistics, file size and target format |
//! | [`mask`] | Synthetic foreground masks and the `SegmentationStrategy` trait |
//! | [`compose`] | Destination-in alpha compositing of a mask onto an image |
//! | [`imaging`] | Codec seam: backend trait, `image`-crate backend, params, statistics |
//! | [`input`] | Input loading and option validation |
//! | [`batch`] | Directory expansion and sequential batch runs |
//! | [`config`] | `pixkit.toml` loading, merging and validation |
//! | [`output`] | CLI text and JSON formatting |
//! | [`logging`] | `tracing-subscriber` setup |
//! | [`error`] | Crate error type |
//!
//! # Design Decisions
//!
//! ## No Segmentation Model
//!
//! Background removal never loads a model. The shipped strategy keeps a
//! soft-edged disc around the centre, which suits centred product shots and
//! portraits. A real segmenter plugs in through
//! [`mask::SegmentationStrategy`] without touching the rest of the crate.
//!
//! ## Bytes Between Stages
//!
//! `enhance` hands encoded bytes from stage to stage, exactly as if each
//! command had been run separately on the previous output. An empty task list
//! returns the input untouched.
//!
//! ## Immutable Configuration
//!
//! A [`config::ToolConfig`] is resolved once and moved into the
//! [`processor::Processor`]. Per-call options override it; nothing mutates it.

pub mod batch;
pub mod compose;
pub mod config;
pub mod error;
pub mod imaging;
pub mod input;
pub mod logging;
pub mod mask;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod quality;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{Error, Result};
pub use input::ImageInput;
pub use processor::{
    BackgroundOptions, CompressOptions, CompressOutput, EnhanceOptions, EnhanceOutput, Processor,
    UpscaleOptions, UpscaleOutput,
};
