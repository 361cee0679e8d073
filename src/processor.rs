//! The four programmatic entry points: compress, upscale, remove background,
//! and enhance (a pipeline of the other three).
//!
//! A [`Processor`] owns a codec backend, a segmentation strategy and an
//! immutable [`ToolConfig`], all fixed at construction. Calls are synchronous
//! and independent: nothing carries over from one call to the next.
//!
//! Every entry point follows the same shape:
//!
//! 1. Validate options (quality, scale, format, output location).
//! 2. Load the input (path or bytes) and validate it.
//! 3. Decode, transform, encode.
//!
//! Steps 1–2 fail with [`Error::Validation`]; step 3 with
//! [`Error::Processing`] naming the operation.

use crate::compose::compose;
use crate::config::ToolConfig;
use crate::error::{BackendResultExt, Error, Result};
use crate::imaging::{
    ImageBackend, OutputFormat, Quality, ResizeParams, RustBackend, compute_stats,
    scaled_dimensions,
};
use crate::input::{
    ImageInput, parse_format, require_format, validate_output_path, validate_quality,
    validate_scale,
};
use crate::mask::{SegmentationStrategy, strategy_for};
use crate::pipeline::{Sequencer, Stage, StageDefaults, StageRunner, parse_tasks};
use crate::quality::{FALLBACK_QUALITY, QualityReport, analyze};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Encoder quality for lossy upscale output.
const UPSCALE_QUALITY: u32 = 95;

const UPSCALE_FORMATS: &[OutputFormat] = &[OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::Webp];
const BACKGROUND_FORMATS: &[OutputFormat] = &[OutputFormat::Png, OutputFormat::Webp];

/// Per-call compression options. Unset fields fall back to configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressOptions {
    pub format: Option<OutputFormat>,
    /// 1–100. `None` estimates a quality from the image.
    pub quality: Option<u32>,
}

impl CompressOptions {
    /// Build options from textual values, e.g. straight from a request.
    pub fn parse(format: Option<&str>, quality: Option<u32>) -> Result<Self> {
        Ok(Self {
            format: format.map(parse_format).transpose()?,
            quality,
        })
    }
}

/// Result of a compression.
#[derive(Debug, Clone, Serialize)]
pub struct CompressOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub quality: u32,
    /// Present when quality was estimated rather than given.
    pub report: Option<QualityReport>,
    pub original_size: u64,
    pub compressed_size: u64,
}

/// Per-call upscale options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpscaleOptions {
    pub format: Option<OutputFormat>,
}

/// Result of an upscale.
#[derive(Debug, Clone, Serialize)]
pub struct UpscaleOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub scale: u32,
    pub original_width: u32,
    pub original_height: u32,
    pub new_width: u32,
    pub new_height: u32,
}

impl AsRef<[u8]> for UpscaleOutput {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for CompressOutput {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Per-call background-removal options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackgroundOptions {
    /// Accepted for compatibility; output is always PNG.
    pub format: Option<OutputFormat>,
}

/// Per-call enhance options. Unset fields fall back to configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhanceOptions {
    pub tasks: Option<Vec<String>>,
    pub scale: Option<u32>,
    pub quality: Option<u32>,
    pub format: Option<OutputFormat>,
    /// Write the result here instead of returning the bytes.
    pub output: Option<PathBuf>,
}

/// What `enhance` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhanceOutput {
    Bytes(Vec<u8>),
    Written(PathBuf),
}

pub struct Processor<B: ImageBackend = RustBackend> {
    backend: B,
    config: ToolConfig,
    strategy: Box<dyn SegmentationStrategy>,
}

impl Processor<RustBackend> {
    pub fn new(config: ToolConfig) -> Self {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl<B: ImageBackend> Processor<B> {
    pub fn with_backend(backend: B, config: ToolConfig) -> Self {
        let strategy = strategy_for(config.background.strategy);
        Self {
            backend,
            config,
            strategy,
        }
    }

    /// Replace the configured segmentation strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn SegmentationStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Re-encode an image, estimating a quality when none is given.
    pub fn compress(
        &self,
        input: impl Into<ImageInput>,
        options: &CompressOptions,
    ) -> Result<CompressOutput> {
        let format = options.format.unwrap_or(self.config.compress.format);
        let fixed = options
            .quality
            .or(self.config.compress.quality)
            .map(validate_quality)
            .transpose()?;

        let bytes = input.into().load()?;
        let original_size = bytes.len() as u64;
        let raster = self.backend.decode(&bytes).in_stage("compress")?;

        let (quality, report) = match fixed {
            Some(q) => (q.value(), None),
            None => match compute_stats(&raster) {
                Ok(stats) => {
                    let report = analyze(&stats, raster.has_alpha(), original_size, format);
                    debug!(?report, "estimated quality");
                    (report.recommended_quality, Some(report))
                }
                Err(e) => {
                    warn!(error = %e, fallback = FALLBACK_QUALITY, "statistics unavailable, using fallback quality");
                    (FALLBACK_QUALITY, None)
                }
            },
        };

        let encoded = self
            .backend
            .encode(&raster, format, Quality::new(quality))
            .in_stage("compress")?;

        info!(
            %format,
            quality,
            original_size,
            compressed_size = encoded.len(),
            "compressed"
        );

        Ok(CompressOutput {
            compressed_size: encoded.len() as u64,
            bytes: encoded,
            format,
            quality,
            report,
            original_size,
        })
    }

    /// Enlarge by 2× or 4× with the configured kernel and sharpening.
    pub fn upscale(
        &self,
        input: impl Into<ImageInput>,
        scale: u32,
        options: &UpscaleOptions,
    ) -> Result<UpscaleOutput> {
        let scale = validate_scale(scale)?;
        let format = options.format.unwrap_or(self.config.upscale.format);
        require_format(format, UPSCALE_FORMATS, "upscale")?;

        let bytes = input.into().load()?;
        let raster = self.backend.decode(&bytes).in_stage("upscale")?;
        let (original_width, original_height) = (raster.width(), raster.height());
        let (new_width, new_height) = scaled_dimensions((original_width, original_height), scale)
            .ok_or_else(|| {
                Error::validation(format!(
                    "{original_width}x{original_height} is too large to upscale {scale}x"
                ))
            })?;

        let resized = self
            .backend
            .resize(
                &raster,
                &ResizeParams {
                    width: new_width,
                    height: new_height,
                    filter: self.config.upscale.filter,
                    sharpening: self.config.upscale.sharpening(),
                },
            )
            .in_stage("upscale")?;
        let encoded = self
            .backend
            .encode(&resized, format, Quality::new(UPSCALE_QUALITY))
            .in_stage("upscale")?;

        info!(scale, new_width, new_height, %format, "upscaled");

        Ok(UpscaleOutput {
            bytes: encoded,
            format,
            scale,
            original_width,
            original_height,
            new_width,
            new_height,
        })
    }

    /// Fade the background to transparent. The result is always PNG.
    pub fn remove_background(
        &self,
        input: impl Into<ImageInput>,
        options: &BackgroundOptions,
    ) -> Result<Vec<u8>> {
        if let Some(format) = options.format {
            require_format(format, BACKGROUND_FORMATS, "remove-bg")?;
            if format != OutputFormat::Png {
                warn!(requested = %format, "background removal always writes PNG");
            }
        }

        let bytes = input.into().load()?;
        let raster = self.backend.decode(&bytes).in_stage("remove-bg")?;
        let mask = self.strategy.mask(&raster);
        let composited = compose(raster, &mask)?;
        let encoded = self
            .backend
            .encode(&composited, OutputFormat::Png, Quality::new(100))
            .in_stage("remove-bg")?;

        info!(
            strategy = self.strategy.name(),
            width = composited.width(),
            height = composited.height(),
            "background removed"
        );
        Ok(encoded)
    }

    /// Run `job` and write the bytes it produces to `output`.
    ///
    /// The destination is checked before `job` runs, so an unusable path
    /// fails without decoding anything.
    pub fn write_to<T: AsRef<[u8]>>(
        &self,
        output: &Path,
        job: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T> {
        validate_output_path(output)?;
        let result = job(self)?;
        write_output(output, result.as_ref())?;
        Ok(result)
    }

    /// Stage parameters for `enhance`: options first, then configuration.
    pub fn stage_defaults(&self, options: &EnhanceOptions) -> Result<StageDefaults> {
        Ok(StageDefaults {
            scale: validate_scale(options.scale.unwrap_or(self.config.upscale.scale))?,
            format: options.format.unwrap_or(self.config.compress.format),
            quality: options
                .quality
                .or(self.config.compress.quality)
                .map(validate_quality)
                .transpose()?,
        })
    }

    /// Run a chain of tasks, feeding each output into the next.
    pub fn enhance(
        &self,
        input: impl Into<ImageInput>,
        options: &EnhanceOptions,
    ) -> Result<EnhanceOutput> {
        let defaults = self.stage_defaults(options)?;
        if let Some(output) = &options.output {
            validate_output_path(output)?;
        }

        let names = options
            .tasks
            .as_deref()
            .unwrap_or(self.config.enhance.tasks.as_slice());
        let tasks = parse_tasks(names, &defaults);
        debug!(tasks = ?tasks, "enhance pipeline");

        let bytes = input.into().load()?;
        let result = Sequencer::new().execute_tasks(self, bytes, tasks)?;

        match &options.output {
            Some(path) => {
                write_output(path, &result)?;
                Ok(EnhanceOutput::Written(path.clone()))
            }
            None => Ok(EnhanceOutput::Bytes(result)),
        }
    }
}

impl<B: ImageBackend> StageRunner for Processor<B> {
    fn run_stage(&self, stage: &Stage, input: Vec<u8>) -> Result<Vec<u8>> {
        match *stage {
            Stage::RemoveBackground => self.remove_background(input, &BackgroundOptions::default()),
            Stage::Upscale { scale } => Ok(self.upscale(input, scale, &UpscaleOptions::default())?.bytes),
            Stage::Compress { format, quality } => {
                let options = CompressOptions {
                    format: Some(format),
                    quality: quality.map(Quality::value),
                };
                Ok(self.compress(input, &options)?.bytes)
            }
        }
    }
}

/// Write encoded bytes to `path` after checking the destination is usable.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    validate_output_path(path)?;
    std::fs::write(path, bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}
